//! Google Calendar source configuration.

use std::time::Duration;

const CLIENT_ID_SUFFIX: &str = ".apps.googleusercontent.com";

/// The installed-app OAuth client registered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthCredentials {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            client_id: id.into(),
            client_secret: secret.into(),
        }
    }

    /// Rejects empty values and ids that are not Google client ids.
    pub fn validate(&self) -> Result<(), &'static str> {
        match (self.client_id.as_str(), self.client_secret.as_str()) {
            ("", _) => Err("empty client_id"),
            (id, _) if !id.ends_with(CLIENT_ID_SUFFIX) => {
                Err("client_id is not a Google OAuth client id")
            }
            (_, "") => Err("empty client_secret"),
            _ => Ok(()),
        }
    }
}

/// Configuration shared by every Google source.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Used for both the code exchange and refreshes.
    pub credentials: OAuthCredentials,
    pub calendar_id: String,
    /// Stored on every new credential.
    pub scopes: Vec<String>,
    /// Bound on each token or calendar request.
    pub timeout: Duration,
}

impl GoogleConfig {
    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    pub const SCOPE_CALENDAR_READONLY: &'static str =
        "https://www.googleapis.com/auth/calendar.readonly";

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Reads the primary calendar with the read-only scope.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            scopes: vec![Self::SCOPE_CALENDAR_READONLY.to_string()],
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_calendar_id(self, calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}
