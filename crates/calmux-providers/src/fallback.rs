//! Cache-backed fetch wrapper shared by every source variant.

use std::future::Future;

use tracing::{debug, warn};

use calmux_core::{Event, EventBatch, SourceConfig};

use crate::cache::FallbackCache;
use crate::error::ProviderResult;
use crate::source::FetchOutcome;

/// Runs a live fetch for `source`, degrading to the cached snapshot on failure.
///
/// On success the fresh batch replaces the snapshot; a failed save is
/// logged and the fresh batch is still returned. On a recoverable failure
/// the snapshot is returned unchanged together with the cause, or an empty
/// batch if there is no usable snapshot. Other failures give an empty batch
/// without consulting the snapshot.
pub async fn fetch_with_fallback<F>(
    cache: &dyn FallbackCache,
    source: &SourceConfig,
    window_days: i64,
    fetch: F,
) -> FetchOutcome
where
    F: Future<Output = ProviderResult<Vec<Event>>>,
{
    match fetch.await {
        Ok(events) => {
            let batch = EventBatch::new(window_days, events);
            debug!(source = %source.id, events = batch.event_count, "fetched events");
            if let Err(e) = cache.save(&source.id, &batch) {
                warn!(source = %source.id, error = %e, "failed to save fallback snapshot");
            }
            FetchOutcome::fresh(batch)
        }
        Err(error) if !error.is_recoverable() => {
            let error = error.with_source_id(&source.id);
            warn!(source = %source.id, error = %error, "fetch failed");
            FetchOutcome::degraded(EventBatch::empty(window_days), error, false)
        }
        Err(error) => {
            let error = error.with_source_id(&source.id);
            warn!(source = %source.id, error = %error, "fetch failed, using fallback snapshot");
            match cache.load(&source.id) {
                Ok(Some(batch)) => FetchOutcome::degraded(batch, error, true),
                Ok(None) => FetchOutcome::degraded(EventBatch::empty(window_days), error, false),
                Err(e) => {
                    warn!(source = %source.id, error = %e, "fallback snapshot unreadable");
                    FetchOutcome::degraded(EventBatch::empty(window_days), error, false)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileFallbackCache;
    use crate::error::{ProviderError, ErrorKind};
    use chrono::{Duration, Local};

    fn source() -> SourceConfig {
        SourceConfig::new("src-1", "Holidays", "iCal", "red")
    }

    fn event(uid: &str) -> Event {
        let start = Local::now() + Duration::hours(1);
        Event::new(&source(), uid, start, start + Duration::hours(1))
    }

    #[tokio::test]
    async fn success_saves_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFallbackCache::new(dir.path());

        let outcome =
            fetch_with_fallback(&cache, &source(), 4, async { Ok(vec![event("a")]) }).await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.batch.event_count, 1);
        assert_eq!(cache.load("src-1").unwrap().unwrap(), outcome.batch);
    }

    #[tokio::test]
    async fn failure_returns_cached_batch_and_cause() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFallbackCache::new(dir.path());
        let cached = EventBatch::new(4, vec![event("old")]);
        cache.save("src-1", &cached).unwrap();

        let outcome = fetch_with_fallback(&cache, &source(), 4, async {
            Err(ProviderError::network("connection refused"))
        })
        .await;

        assert!(outcome.from_cache);
        assert_eq!(outcome.batch, cached);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind(), ErrorKind::Network);
        assert_eq!(error.source_id(), Some("src-1"));
    }

    #[tokio::test]
    async fn failure_without_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFallbackCache::new(dir.path());

        let outcome = fetch_with_fallback(&cache, &source(), 4, async {
            Err(ProviderError::parse("not a calendar"))
        })
        .await;

        assert!(outcome.batch.is_empty());
        assert!(!outcome.from_cache);
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn configuration_error_skips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFallbackCache::new(dir.path());
        cache
            .save("src-1", &EventBatch::new(4, vec![event("old")]))
            .unwrap();

        let outcome = fetch_with_fallback(&cache, &source(), 4, async {
            Err(ProviderError::configuration("Url must be specified"))
        })
        .await;

        assert!(outcome.batch.is_empty());
        assert!(!outcome.from_cache);
        assert_eq!(outcome.error.unwrap().kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn corrupt_snapshot_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileFallbackCache::new(dir.path());
        std::fs::write(cache.path_for("src-1"), "{").unwrap();

        let outcome = fetch_with_fallback(&cache, &source(), 4, async {
            Err(ProviderError::network("timeout"))
        })
        .await;

        assert!(outcome.batch.is_empty());
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn failed_save_still_returns_fresh_batch() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();
        let cache = FileFallbackCache::new(&blocker);

        let outcome =
            fetch_with_fallback(&cache, &source(), 4, async { Ok(vec![event("a")]) }).await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.batch.event_count, 1);
    }
}
