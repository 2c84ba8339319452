use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP error! Status: {0}")]
    HttpStatus(u16),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Channel closed: {0}")]
    ChannelClosed(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Timeout error: operation timed out after {0:?}")]
    Timeout(Duration),
}

impl GuardError {
    /// True for failures of the transport itself rather than of the payload.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            GuardError::Network(_) | GuardError::ChannelClosed(_) | GuardError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for GuardError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            GuardError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            GuardError::Decode(err.to_string())
        } else {
            GuardError::Network(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GuardError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                GuardError::ChannelClosed(err.to_string())
            }
            other => GuardError::Network(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GuardError {
    fn from(err: serde_json::Error) -> Self {
        GuardError::Decode(err.to_string())
    }
}

impl From<base64::DecodeError> for GuardError {
    fn from(err: base64::DecodeError) -> Self {
        GuardError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for GuardError {
    fn from(err: std::io::Error) -> Self {
        GuardError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message() {
        assert_eq!(GuardError::HttpStatus(503).to_string(), "HTTP error! Status: 503");
    }

    #[test]
    fn test_connectivity_classification() {
        assert!(GuardError::Network("refused".into()).is_connectivity());
        assert!(GuardError::ChannelClosed("not open".into()).is_connectivity());
        assert!(!GuardError::HttpStatus(500).is_connectivity());
        assert!(!GuardError::Decode("bad json".into()).is_connectivity());
    }

    #[test]
    fn test_from_json_error() {
        let err: GuardError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, GuardError::Decode(_)));
    }
}
