//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] is one provider variant (Google, iCal feed, ...). A
//! single instance serves every configured source of its kind: the
//! [`SourceConfig`] is passed to each call rather than baked into the
//! instance, so the registry can build the lookup table once at startup.
//!
//! Fetching never fails outright. A source that cannot reach its upstream
//! answers with the last snapshot from its fallback cache (or an empty
//! batch) and reports the cause alongside it in a [`FetchOutcome`].

use std::future::Future;
use std::pin::Pin;

use calmux_core::{DEFAULT_WINDOW_DAYS, EventBatch, NewSource, SourceConfig, SourceEdits};

use crate::error::{ProviderError, ProviderResult};

/// A boxed future for async trait methods.
///
/// Boxing keeps [`CalendarSource`] object-safe so the registry can hold
/// `Arc<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The result of fetching one source.
///
/// `batch` is always usable. When `error` is set the batch is degraded:
/// either the cached snapshot (`from_cache`) or empty.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Events to show for the source.
    pub batch: EventBatch,
    /// Why the live fetch failed, if it did.
    pub error: Option<ProviderError>,
    /// Whether `batch` was read back from the fallback cache.
    pub from_cache: bool,
}

impl FetchOutcome {
    /// A successful live fetch.
    pub fn fresh(batch: EventBatch) -> Self {
        Self {
            batch,
            error: None,
            from_cache: false,
        }
    }

    /// A failed live fetch answered with `batch`.
    pub fn degraded(batch: EventBatch, error: ProviderError, from_cache: bool) -> Self {
        Self {
            batch,
            error: Some(error),
            from_cache,
        }
    }

    /// Returns true if the live fetch failed.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the outcome into the batch and the optional failure cause.
    pub fn into_parts(self) -> (EventBatch, Option<ProviderError>) {
        (self.batch, self.error)
    }
}

/// A calendar provider variant.
///
/// # Implementation Notes
///
/// - `fetch_events` must replace a non-positive `window_days` with
///   [`default_window_days`](Self::default_window_days), keep only events
///   starting in `[now, now + window)` and go through
///   [`fetch_with_fallback`](crate::fetch_with_fallback) so failures degrade
///   to the cached snapshot.
/// - Every network call must be bounded by a timeout.
/// - `validate_new` receives the id allocated by the registry and must use
///   it unchanged.
pub trait CalendarSource: Send + Sync {
    /// Returns the provider tag this variant is registered under.
    fn kind(&self) -> &str;

    /// Window length used when the caller asks for zero or negative days.
    fn default_window_days(&self) -> i64 {
        DEFAULT_WINDOW_DAYS
    }

    /// Fetches and normalizes the events of `source` for the next
    /// `window_days` days.
    fn fetch_events<'a>(
        &'a self,
        source: &'a SourceConfig,
        window_days: i64,
    ) -> BoxFuture<'a, FetchOutcome>;

    /// Validates `input` and builds the config of a new source with `id`.
    ///
    /// May perform external work, such as exchanging an authorization code.
    fn validate_new<'a>(
        &'a self,
        id: String,
        input: &'a NewSource,
    ) -> BoxFuture<'a, ProviderResult<SourceConfig>>;

    /// Validates `edits` against `existing` and builds the updated config.
    ///
    /// The id, provider and credential of `existing` are preserved.
    fn validate_update(
        &self,
        existing: &SourceConfig,
        edits: &SourceEdits,
    ) -> ProviderResult<SourceConfig>;

    /// Releases external resources held for a removed source.
    fn on_removed<'a>(&'a self, _source: &'a SourceConfig) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

/// Returns `value` trimmed, or a configuration error naming `field` when
/// it is blank.
pub fn require<'v>(value: &'v str, field: &str) -> ProviderResult<&'v str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ProviderError::configuration(format!(
            "{field} must be specified"
        )))
    } else {
        Ok(trimmed)
    }
}

/// Applies the name and colour of `edits` to a copy of `existing`.
pub(crate) fn apply_common_edits(
    existing: &SourceConfig,
    edits: &SourceEdits,
) -> ProviderResult<SourceConfig> {
    let mut updated = existing.clone();
    updated.display_name = require(&edits.display_name, "Name")?.to_string();
    updated.colour = require(&edits.colour, "Colour")?.to_string();
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn fresh_outcome_is_not_degraded() {
        let outcome = FetchOutcome::fresh(EventBatch::empty(4));
        assert!(!outcome.is_degraded());
        assert!(!outcome.from_cache);
    }

    #[test]
    fn degraded_outcome_carries_cause() {
        let outcome = FetchOutcome::degraded(
            EventBatch::empty(4),
            ProviderError::network("connection refused"),
            true,
        );
        assert!(outcome.is_degraded());

        let (batch, error) = outcome.into_parts();
        assert!(batch.is_empty());
        assert_eq!(error.unwrap().kind(), ErrorKind::Network);
    }

    #[test]
    fn require_trims_and_rejects_blank() {
        assert_eq!(require("  Work ", "Name").unwrap(), "Work");

        let err = require("   ", "Colour").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.message(), "Colour must be specified");
    }

    #[test]
    fn common_edits_keep_identity() {
        let existing = SourceConfig::new("id-1", "Work", "Google", "blue")
            .with_credential_ref("id-1");
        let updated =
            apply_common_edits(&existing, &SourceEdits::new("Office", "green")).unwrap();

        assert_eq!(updated.id, "id-1");
        assert_eq!(updated.provider_kind, "Google");
        assert_eq!(updated.display_name, "Office");
        assert_eq!(updated.colour, "green");
        assert_eq!(updated.credential_ref.as_deref(), Some("id-1"));
    }
}
