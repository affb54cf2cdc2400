//! Stored credentials of authenticated sources.
//!
//! A [`Credential`] is the token set obtained when an authorization code is
//! exchanged. It is kept per source in a [`CredentialStore`] and deleted
//! when the source is removed.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{Span, debug, info};

use calmux_core::component_span;

use crate::error::{ProviderError, ProviderResult};
use crate::fs::{file_key, read_json, remove_file, write_json_atomic};

/// Margin subtracted from the reported lifetime so a token is refreshed
/// before the server starts rejecting it.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Tokens granted to one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token sent with calendar requests.
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Already shortened by the refresh margin. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Time of the grant or of the latest refresh.
    pub refreshed_at: DateTime<Utc>,
}

impl Credential {
    /// Builds a credential from a token grant; `lifetime_secs` is the
    /// grant's `expires_in`.
    pub fn new(
        token: impl Into<String>,
        refresh: Option<String>,
        lifetime_secs: Option<i64>,
        scopes: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: token.into(),
            refresh_token: refresh,
            expires_at: lifetime_secs.map(|secs| expiry_from(now, secs)),
            scopes,
            refreshed_at: now,
        }
    }

    /// True once the access token should no longer be used.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Applies a refresh grant. The refresh token is only replaced when
    /// the grant rotates it.
    pub fn refreshed(
        self,
        token: impl Into<String>,
        refresh: Option<String>,
        lifetime_secs: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: token.into(),
            refresh_token: refresh.or(self.refresh_token),
            expires_at: lifetime_secs.map(|secs| expiry_from(now, secs)),
            refreshed_at: now,
            ..self
        }
    }
}

fn expiry_from(now: DateTime<Utc>, lifetime_secs: i64) -> DateTime<Utc> {
    now + Duration::seconds(lifetime_secs - EXPIRY_MARGIN_SECS)
}

/// Durable per-source credential storage.
pub trait CredentialStore: Send + Sync {
    /// Returns the credential stored under `key`, or `None`.
    fn load(&self, key: &str) -> ProviderResult<Option<Credential>>;

    /// Stores `credential` under `key`, replacing any previous one.
    fn save(&self, key: &str, credential: &Credential) -> ProviderResult<()>;

    /// Deletes the credential stored under `key`. Deleting nothing is not an error.
    fn delete(&self, key: &str) -> ProviderResult<()>;
}

/// Credential store keeping one `token_<key>.json` file per source.
///
/// Files are written atomically and, on unix, readable by the owner only.
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
    span: Span,
}

impl FileCredentialStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            span: component_span("credential_store"),
        }
    }

    /// Records store activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the credential path for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("token_{}.json", file_key(key)))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self, key: &str) -> ProviderResult<Option<Credential>> {
        let _enter = self.span.enter();
        let credential: Option<Credential> = read_json(&self.path_for(key)).map_err(|e| {
            ProviderError::authentication(format!("stored credential is unreadable: {}", e.message()))
        })?;
        debug!(key = %key, found = credential.is_some(), "loaded credential");
        Ok(credential)
    }

    fn save(&self, key: &str, credential: &Credential) -> ProviderResult<()> {
        let _enter = self.span.enter();
        write_json_atomic(&self.path_for(key), credential, true)?;
        debug!(key = %key, "saved credential");
        Ok(())
    }

    fn delete(&self, key: &str) -> ProviderResult<()> {
        let _enter = self.span.enter();
        remove_file(&self.path_for(key))?;
        info!(key = %key, "deleted credential");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn credential() -> Credential {
        Credential::new(
            "access-token",
            Some("refresh-token".to_string()),
            Some(3600),
            vec!["calendar.readonly".to_string()],
        )
    }

    #[test]
    fn new_credential_is_valid() {
        let credential = credential();
        assert!(credential.expires_at.is_some());
        assert!(!credential.is_expired());
    }

    #[test]
    fn past_expiry_is_expired() {
        let mut credential = credential();
        credential.expires_at = Some(Utc::now() - Duration::hours(1));
        assert!(credential.is_expired());

        credential.expires_at = None;
        assert!(!credential.is_expired());
    }

    #[test]
    fn short_lifetime_counts_as_expired() {
        let credential = Credential::new("access", None, Some(30), vec![]);
        assert!(credential.is_expired());
    }

    #[test]
    fn refresh_keeps_refresh_token() {
        let refreshed = credential().refreshed("new-access", None, Some(3600));
        assert_eq!(refreshed.access_token, "new-access");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("refresh-token"));

        let rotated = refreshed.refreshed("newer", Some("rotated".to_string()), None);
        assert_eq!(rotated.refresh_token.as_deref(), Some("rotated"));
        assert!(rotated.expires_at.is_none());
    }

    #[test]
    fn store_save_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());

        assert!(store.load("src-1").unwrap().is_none());

        let original = credential();
        store.save("src-1", &original).unwrap();
        assert!(dir.path().join("token_src-1.json").exists());
        assert_eq!(store.load("src-1").unwrap().unwrap(), original);

        store.delete("src-1").unwrap();
        assert!(store.load("src-1").unwrap().is_none());
        store.delete("src-1").unwrap();
    }

    #[test]
    fn unreadable_credential_is_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path());
        std::fs::write(store.path_for("src-1"), "nope").unwrap();

        let err = store.load("src-1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }
}
