//! Server error types.

use std::io;

use thiserror::Error;

use calmux_providers::{ProviderError, ErrorKind};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A source variant, the registry or a validation step failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// No source has the given id.
    #[error("Invalid calendar identifier: {id}")]
    NotFound { id: String },

    /// The source list could not be read or written.
    #[error("Persistence error ({path}): {message}")]
    Persistence { path: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ServerError {
    /// Creates a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a persistence error.
    pub fn persistence(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Persistence {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true if the error is a rejected user input rather than a fault.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Provider(e) => matches!(
                e.kind(),
                ErrorKind::Configuration | ErrorKind::UnknownProvider
            ),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_display_transparently() {
        let err = ServerError::from(ProviderError::configuration("Name must be specified"));
        assert_eq!(err.to_string(), "configuration error: Name must be specified");
        assert!(err.is_validation());
    }

    #[test]
    fn not_found_names_the_id() {
        let err = ServerError::not_found("abc");
        assert_eq!(err.to_string(), "Invalid calendar identifier: abc");
        assert!(err.is_validation());
    }

    #[test]
    fn persistence_is_a_fault() {
        let err = ServerError::persistence("/tmp/config.json", "disk full");
        assert!(!err.is_validation());
        assert!(err.to_string().contains("disk full"));
    }
}
