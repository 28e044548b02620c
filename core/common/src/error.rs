//! Common error types for Skylift.

use thiserror::Error;

/// Top-level error type for Skylift operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition failed.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network-level failure while talking to the provider.
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the provider.
        status: u16,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// An upload session could not be established.
    #[error("Upload session creation failed: {0}")]
    Session(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file upload failed. The message is stable for callers; the
    /// underlying cause remains reachable through `source()`.
    #[error("failed to upload file")]
    Upload(#[source] Box<Error>),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn upload_error_message_is_stable() {
        let inner = Error::Session("response contained no uploadUrl".to_string());
        let err = Error::Upload(Box::new(inner));

        assert_eq!(err.to_string(), "failed to upload file");
    }

    #[test]
    fn upload_error_keeps_cause_chain() {
        let inner = Error::Api {
            status: 507,
            message: "insufficient storage".to_string(),
        };
        let err = Error::Upload(Box::new(inner));

        let source = err.source().expect("upload error must carry a source");
        assert!(source.to_string().contains("507"));
        assert!(source.to_string().contains("insufficient storage"));
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();

        assert!(matches!(err, Error::Io(_)));
    }
}
