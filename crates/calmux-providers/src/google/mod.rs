//! Google Calendar sources.
//!
//! Google sources are [`AuthenticatedCalendarSource`]s wired to a
//! [`GoogleAuthorizer`]. Adding a source exchanges the authorization code
//! the user copied from Google's consent page for a credential, which is
//! stored under the new source's id and removed with it.
//!
//! # Example
//!
//! ```ignore
//! use calmux_providers::google::{google_source, GoogleConfig, OAuthCredentials};
//!
//! let config = GoogleConfig::new(OAuthCredentials::new(client_id, client_secret));
//! let source = google_source(config, credentials, cache, &app_span)?;
//! registry.register(Arc::new(source));
//! ```

mod authorizer;
mod client;
mod config;
mod oauth;

use std::sync::Arc;

use tracing::Span;

use calmux_core::child_span;

pub use authorizer::GoogleAuthorizer;
pub use client::GoogleCalendarClient;
pub use config::{GoogleConfig, OAuthCredentials};
pub use oauth::{OAuthClient, OOB_REDIRECT_URI};

use crate::authenticated::AuthenticatedCalendarSource;
use crate::cache::FallbackCache;
use crate::credentials::CredentialStore;
use crate::error::ProviderResult;

/// Provider tag of Google sources.
pub const GOOGLE_KIND: &str = "Google";

/// Builds the Google source variant. Its spans are nested under `parent`.
pub fn google_source(
    config: GoogleConfig,
    credentials: Arc<dyn CredentialStore>,
    cache: Arc<dyn FallbackCache>,
    parent: &Span,
) -> ProviderResult<AuthenticatedCalendarSource> {
    let timeout = config.timeout;
    let authorizer = GoogleAuthorizer::new(config, Arc::clone(&credentials))?
        .with_span(child_span(parent, "google_authorizer"));
    Ok(
        AuthenticatedCalendarSource::new(GOOGLE_KIND, Arc::new(authorizer), credentials, cache)
            .with_timeout(timeout)
            .with_span(child_span(parent, "google_source")),
    )
}
