//! CDP error types.

use pipdock_protocols::HostError;
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to the browser.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Browser not running with remote debugging.
    #[error("Browser not available at {0}. Start it with: chrome --remote-debugging-port=9222")]
    BrowserNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    /// No tracked page or window with this id.
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// JavaScript execution error.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for HostError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Protocol { message, .. } => HostError::from_host_message(message),
            CdpError::JavaScript(message) => HostError::from_host_message(message),
            CdpError::TargetNotFound(id) => HostError::NotFound(id),
            CdpError::ConnectionFailed(_)
            | CdpError::BrowserNotAvailable(_)
            | CdpError::WebSocket(_)
            | CdpError::SessionClosed => HostError::Unavailable(e.to_string()),
            other => HostError::Operation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_maps_to_not_found() {
        let err: HostError = CdpError::Protocol {
            code: -32000,
            message: "No target with given id found".to_string(),
        }
        .into();
        assert!(err.is_not_found());

        let err: HostError = CdpError::TargetNotFound("window 4".to_string()).into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_protocol_errors_are_operations() {
        let err: HostError = CdpError::Protocol {
            code: -32000,
            message: "Browser window not found".to_string(),
        }
        .into();
        // "not found" wording still counts as missing
        assert!(err.is_not_found());

        let err: HostError = CdpError::Protocol {
            code: -32602,
            message: "Invalid parameters".to_string(),
        }
        .into();
        assert_eq!(err, HostError::Operation("Invalid parameters".to_string()));
    }

    #[test]
    fn test_transport_errors_are_unavailable() {
        let err: HostError = CdpError::SessionClosed.into();
        assert!(matches!(err, HostError::Unavailable(_)));

        let err: HostError = CdpError::Timeout("Runtime.evaluate".to_string()).into();
        assert!(matches!(err, HostError::Operation(_)));
    }
}
