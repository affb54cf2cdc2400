//! Failures of sources, caches and the registry.
//!
//! A [`ProviderError`] is a message tagged with an [`ErrorKind`]. The kind
//! is what callers branch on: configuration problems go back to the user
//! unchanged, while fetch problems fall back to the last cached batch.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// What went wrong, independent of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field is missing or malformed when a source is created
    /// or edited.
    Configuration,
    /// The provider tag has no registered variant.
    UnknownProvider,
    /// No usable credential, or the authorization code was refused.
    Authentication,
    /// Timeout, refused connection or non-success HTTP status.
    Network,
    /// The remote payload could not be read.
    Parse,
    /// Reading or writing local state failed.
    Persistence,
    /// A broken invariant inside calmux itself.
    Internal,
}

impl ErrorKind {
    /// Fetch failures of these kinds are answered from the fallback cache.
    pub fn is_recoverable(self) -> bool {
        matches!(self, Self::Authentication | Self::Network | Self::Parse)
    }

    /// Lower-case name used in [`Display`](fmt::Display) output.
    pub fn name(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::UnknownProvider => "unknown provider",
            Self::Authentication => "authentication",
            Self::Network => "network",
            Self::Parse => "parse",
            Self::Persistence => "persistence",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failure raised by a source, a cache or the registry.
///
/// Shown as `<kind> error: <message>`, prefixed with `[<source id>]` once
/// [`with_source_id`](Self::with_source_id) attributed it.
#[derive(Debug, Error)]
pub struct ProviderError {
    kind: ErrorKind,
    message: String,
    /// Set once the error is attributed to a configured source.
    source_id: Option<String>,
    #[source]
    cause: Option<Cause>,
}

impl ProviderError {
    /// An unattributed error with no cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source_id: None,
            cause: None,
        }
    }

    /// Invalid user input, returned as is to whoever created the source.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// The error for a provider tag no variant answers to.
    pub fn unknown_provider(tag: &str) -> Self {
        Self::new(
            ErrorKind::UnknownProvider,
            format!("Invalid Calendar provider '{tag}'"),
        )
    }

    /// Missing, expired or refused credentials.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// A transport failure or an unexpected HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    /// A network error for `operation` running past `limit`.
    pub fn timeout(operation: &str, limit: Duration) -> Self {
        Self::network(format!(
            "{operation} timed out after {}s",
            limit.as_secs_f64()
        ))
    }

    /// A remote document calmux cannot read.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    /// A local file could not be read or written.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Persistence, message)
    }

    /// A bug, such as a task that panicked.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Attributes the error to the source `id`.
    pub fn with_source_id(self, id: impl Into<String>) -> Self {
        Self {
            source_id: Some(id.into()),
            ..self
        }
    }

    /// Keeps `cause` as the error's [`source`](std::error::Error::source).
    pub fn with_cause(self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            cause: Some(Box::new(cause)),
            ..self
        }
    }

    /// What callers should branch on.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message without the kind or source prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The source the error was attributed to, if any.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    /// See [`ErrorKind::is_recoverable`].
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_id {
            Some(id) => write!(f, "[{id}] {} error: {}", self.kind, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

/// Result alias used throughout the providers crate.
pub type ProviderResult<T> = Result<T, ProviderError>;
