//! OAuth-backed remote calendar sources.
//!
//! An [`AuthenticatedCalendarSource`] does not talk to any API itself. It
//! asks a [`CalendarAuthorizer`] for a [`RemoteCalendarClient`] bound to the
//! source's stored credential, lists the events of the window and
//! normalizes them. The Google implementation of both collaborators lives
//! in [`crate::google`].

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, Span, debug, info};

use calmux_core::{Event, NewSource, SourceConfig, SourceEdits, TimeWindow, component_span};

use crate::cache::FallbackCache;
use crate::credentials::{Credential, CredentialStore};
use crate::error::{ProviderError, ProviderResult};
use crate::fallback::fetch_with_fallback;
use crate::normalize::normalize_in_window;
use crate::raw_event::RawEvent;
use crate::source::{BoxFuture, CalendarSource, FetchOutcome, apply_common_edits, require};

/// A client that can list events of one remote calendar.
pub trait RemoteCalendarClient: Send + Sync {
    /// Lists the events overlapping `window`.
    fn list_events<'a>(
        &'a self,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>>;
}

/// Grants access to remote calendars.
pub trait CalendarAuthorizer: Send + Sync {
    /// Returns a client authorized with the stored credential of `source`.
    ///
    /// Fails with an authentication error when there is no usable credential.
    fn authorized_client<'a>(
        &'a self,
        source: &'a SourceConfig,
    ) -> BoxFuture<'a, ProviderResult<Box<dyn RemoteCalendarClient>>>;

    /// Exchanges a one-time authorization code for a credential.
    fn exchange_auth_code<'a>(&'a self, code: &'a str) -> BoxFuture<'a, ProviderResult<Credential>>;
}

/// A source backed by an authenticated remote calendar API.
pub struct AuthenticatedCalendarSource {
    kind: String,
    authorizer: Arc<dyn CalendarAuthorizer>,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn FallbackCache>,
    timeout: Duration,
    span: Span,
}

impl AuthenticatedCalendarSource {
    /// Default bound on each remote call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a variant registered under `kind`.
    pub fn new(
        kind: impl Into<String>,
        authorizer: Arc<dyn CalendarAuthorizer>,
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<dyn FallbackCache>,
    ) -> Self {
        Self {
            kind: kind.into(),
            authorizer,
            credentials,
            cache,
            timeout: Self::DEFAULT_TIMEOUT,
            span: component_span("authenticated_source"),
        }
    }

    /// Sets the bound on each remote call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Records activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn collect(
        &self,
        source: &SourceConfig,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<Event>> {
        let client = tokio::time::timeout(self.timeout, self.authorizer.authorized_client(source))
            .await
            .map_err(|_| ProviderError::timeout("authorization", self.timeout))??;

        let raw = tokio::time::timeout(self.timeout, client.list_events(window))
            .await
            .map_err(|_| ProviderError::timeout("event listing", self.timeout))??;

        let events = normalize_in_window(&raw, source, window);
        debug!(listed = raw.len(), kept = events.len(), "listed remote events");
        Ok(events)
    }
}

impl CalendarSource for AuthenticatedCalendarSource {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn fetch_events<'a>(
        &'a self,
        source: &'a SourceConfig,
        window_days: i64,
    ) -> BoxFuture<'a, FetchOutcome> {
        let days = if window_days <= 0 {
            self.default_window_days()
        } else {
            window_days
        };
        let span = tracing::debug_span!(parent: &self.span, "fetch", source = %source.id, days);

        Box::pin(
            async move {
                let window = TimeWindow::days_from(Utc::now(), days);
                fetch_with_fallback(
                    self.cache.as_ref(),
                    source,
                    days,
                    self.collect(source, &window),
                )
                .await
            }
            .instrument(span),
        )
    }

    fn validate_new<'a>(
        &'a self,
        id: String,
        input: &'a NewSource,
    ) -> BoxFuture<'a, ProviderResult<SourceConfig>> {
        let span = tracing::info_span!(parent: &self.span, "authorize", source = %id);
        Box::pin(
            async move {
                let name = require(&input.display_name, "Name")?;
                let colour = require(&input.colour, "Colour")?;
                let code = require(input.auth_code.as_deref().unwrap_or_default(), "Auth code")?;

                let credential =
                    tokio::time::timeout(self.timeout, self.authorizer.exchange_auth_code(code))
                        .await
                        .map_err(|_| ProviderError::timeout("code exchange", self.timeout))??;
                self.credentials.save(&id, &credential)?;
                info!("stored credential for new source");

                Ok(SourceConfig::new(id.clone(), name, self.kind.as_str(), colour)
                    .with_credential_ref(id))
            }
            .instrument(span),
        )
    }

    fn validate_update(
        &self,
        existing: &SourceConfig,
        edits: &SourceEdits,
    ) -> ProviderResult<SourceConfig> {
        apply_common_edits(existing, edits)
    }

    fn on_removed<'a>(&'a self, source: &'a SourceConfig) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(
            async move {
                let snapshot = self.cache.delete(&source.id);
                self.credentials.delete(source.credential_key())?;
                snapshot
            }
            .instrument(self.span.clone()),
        )
    }
}
