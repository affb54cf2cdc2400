//! Credential-backed access to Google calendars.

use std::sync::Arc;

use tracing::{Instrument, Span, debug, warn};

use calmux_core::{SourceConfig, component_span};

use crate::authenticated::{CalendarAuthorizer, RemoteCalendarClient};
use crate::credentials::{Credential, CredentialStore};
use crate::error::{ProviderError, ProviderResult};
use crate::source::BoxFuture;

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;
use super::oauth::OAuthClient;

/// [`CalendarAuthorizer`] for Google Calendar.
///
/// Loads the stored credential of a source, refreshes it when the access
/// token has expired (persisting the refreshed token) and hands out a
/// [`GoogleCalendarClient`] for the configured calendar.
pub struct GoogleAuthorizer {
    config: GoogleConfig,
    oauth: OAuthClient,
    credentials: Arc<dyn CredentialStore>,
    span: Span,
}

impl GoogleAuthorizer {
    /// Creates an authorizer over `credentials`.
    pub fn new(config: GoogleConfig, credentials: Arc<dyn CredentialStore>) -> ProviderResult<Self> {
        let oauth = OAuthClient::new(config.credentials.clone(), config.timeout)?;
        Ok(Self {
            config,
            oauth,
            credentials,
            span: component_span("google_authorizer"),
        })
    }

    /// Records activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn fresh_credential(&self, key: &str) -> ProviderResult<Credential> {
        let credential = self.credentials.load(key)?.ok_or_else(|| {
            ProviderError::authentication("no stored credential, add the source again")
        })?;

        if !credential.is_expired() {
            return Ok(credential);
        }

        debug!(key = %key, "access token expired, refreshing");
        let refreshed = self.oauth.refresh(credential).await?;
        if let Err(e) = self.credentials.save(key, &refreshed) {
            warn!(key = %key, error = %e, "failed to persist refreshed credential");
        }
        Ok(refreshed)
    }
}

impl CalendarAuthorizer for GoogleAuthorizer {
    fn authorized_client<'a>(
        &'a self,
        source: &'a SourceConfig,
    ) -> BoxFuture<'a, ProviderResult<Box<dyn RemoteCalendarClient>>> {
        Box::pin(
            async move {
                let credential = self.fresh_credential(source.credential_key()).await?;
                let client = GoogleCalendarClient::new(
                    credential.access_token,
                    self.config.calendar_id.as_str(),
                    self.config.timeout,
                )?;
                Ok(Box::new(client) as Box<dyn RemoteCalendarClient>)
            }
            .instrument(self.span.clone()),
        )
    }

    fn exchange_auth_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, ProviderResult<Credential>> {
        Box::pin(
            self.oauth
                .exchange_code(code, &self.config.scopes)
                .instrument(self.span.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::FileCredentialStore;
    use crate::error::ErrorKind;
    use crate::google::OAuthCredentials;

    fn authorizer(dir: &std::path::Path) -> GoogleAuthorizer {
        let config = GoogleConfig::new(OAuthCredentials::new(
            "id.apps.googleusercontent.com",
            "secret",
        ));
        GoogleAuthorizer::new(config, Arc::new(FileCredentialStore::new(dir))).unwrap()
    }

    #[tokio::test]
    async fn missing_credential_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceConfig::new("src-1", "Work", "Google", "blue");

        let err = authorizer(dir.path())
            .authorized_client(&source)
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn valid_credential_yields_client() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        store
            .save("src-1", &Credential::new("token", None, Some(3600), vec![]))
            .unwrap();
        let source =
            SourceConfig::new("src-1", "Work", "Google", "blue").with_credential_ref("src-1");

        assert!(authorizer(dir.path()).authorized_client(&source).await.is_ok());
    }
}
