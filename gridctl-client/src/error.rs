//! Error types for the gridctl collaborator clients

use std::time::Duration;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to a grid service
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service returned an error status code
    #[error("Service error (status {status}): {message}")]
    ApiError {
        /// Status code reported by the service
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Call did not complete within its bound
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Control or status exchange failed mid-sequence
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// No client is configured for this kind of service
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Local file system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::RequestFailed(e) => e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_from_status() {
        assert!(ClientError::api_error(404, "gone").is_not_found());
        assert!(!ClientError::api_error(500, "boom").is_not_found());
        assert!(ClientError::NotFound("job".into()).is_not_found());
    }

    #[test]
    fn test_timeout_detection() {
        assert!(ClientError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!ClientError::Protocol("550".into()).is_timeout());
    }
}
