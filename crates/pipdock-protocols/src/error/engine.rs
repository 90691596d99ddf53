//! Errors surfaced by the controller and the page engine.

use thiserror::Error;

use super::HostError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipdockError {
    /// Missing or invalid URL, or unusable request fields.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// A host call failed for a reason other than a benign not-found race.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The host refused to enter Picture-in-Picture.
    #[error("Picture-in-Picture activation failed: {0}")]
    Activation(String),

    /// The messaging channel is not established or was torn down.
    #[error("Bridge unavailable: {0}")]
    BridgeUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = PipdockError::Validation("Missing URL".to_string());
        assert_eq!(err.to_string(), "Invalid request: Missing URL");
    }

    #[test]
    fn test_host_error_is_transparent() {
        let err: PipdockError = HostError::Operation("boom".to_string()).into();
        assert_eq!(err.to_string(), "Host operation failed: boom");
    }

    #[test]
    fn test_activation_display() {
        let err = PipdockError::Activation("not allowed without user gesture".to_string());
        assert!(err.to_string().contains("user gesture"));
    }

    #[test]
    fn test_bridge_unavailable_display() {
        let err = PipdockError::BridgeUnavailable("controller gone".to_string());
        assert!(err.to_string().starts_with("Bridge unavailable"));
    }
}
