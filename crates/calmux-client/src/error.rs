//! Client error types.

use thiserror::Error;

use calmux_core::TracingError;
use calmux_providers::ProviderError;
use calmux_server::ServerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Settings file missing, unreadable or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// A secret reference could not be resolved.
    #[error("secret error: {0}")]
    Secret(String),

    /// Building a source variant failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A source operation was rejected or failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Logging could not be set up.
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// Output could not be serialized.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
