//! Error types for the Radio Browser directory client

use thiserror::Error;

/// Directory client errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Every mirror failed; one message per mirror, in the order tried
    #[error("All mirrors failed: {}", .errors.join(", "))]
    Unavailable { errors: Vec<String> },

    /// A parameter could not be turned into a request
    #[error("Invalid directory query: {0}")]
    InvalidQuery(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for directory operations
pub type Result<T> = std::result::Result<T, DirectoryError>;

impl DirectoryError {
    /// Per-mirror failure messages, empty for other variants
    pub fn mirror_errors(&self) -> &[String] {
        match self {
            DirectoryError::Unavailable { errors } => errors,
            _ => &[],
        }
    }
}

impl From<DirectoryError> for bridge_traits::error::BridgeError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::BridgeError(e) => e,
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display_joins_messages() {
        let error = DirectoryError::Unavailable {
            errors: vec![
                "HTTP 503: Service Unavailable".to_string(),
                "Connection failed: refused".to_string(),
            ],
        };

        assert_eq!(
            error.to_string(),
            "All mirrors failed: HTTP 503: Service Unavailable, Connection failed: refused"
        );
        assert_eq!(error.mirror_errors().len(), 2);
    }

    #[test]
    fn test_error_conversion() {
        let error = DirectoryError::InvalidQuery("count must be positive".to_string());
        let bridge_error: bridge_traits::error::BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            bridge_traits::error::BridgeError::OperationFailed(msg) if msg.contains("count")
        ));
    }
}
