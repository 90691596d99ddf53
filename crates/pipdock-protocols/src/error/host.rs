//! Host operation errors.

use thiserror::Error;

/// Result of a call into a host service.
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised by the windowing, tab, injection, and page services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    /// The window, tab, or element no longer exists. Always benign.
    #[error("No such entity: {0}")]
    NotFound(String),

    /// The host rejected the operation.
    #[error("Host operation failed: {0}")]
    Operation(String),

    /// The host is not reachable (connection lost, not started).
    #[error("Host unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Whether this is the benign "entity no longer exists" race.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HostError::NotFound(_))
    }

    /// Build an error from a raw host message, recognizing the host's
    /// "no window/tab/target with id" wording as [`HostError::NotFound`].
    pub fn from_host_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let missing = ["no window with id", "no tab with id", "no target with given id", "no target with id", "not found"];
        if missing.iter().any(|needle| lower.contains(needle)) {
            HostError::NotFound(message)
        } else {
            HostError::Operation(message)
        }
    }
}
