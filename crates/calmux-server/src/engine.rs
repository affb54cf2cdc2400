//! Merged feed across every configured source.
//!
//! Sources are fetched concurrently and joined before the merge. A source
//! that fails contributes whatever its [`CalendarSource`] answered with
//! (cached or empty) and never holds back the others. Fetches of the same
//! source are serialized so its fallback cache entry has one writer.
//!
//! [`CalendarSource`]: calmux_providers::CalendarSource

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{Instrument, Span, debug, info, warn};

use calmux_core::{Event, SourceConfig, component_span};
use calmux_providers::{ProviderError, SourceRegistry};

use crate::config_store::ConfigStore;
use crate::error::ServerResult;

/// How one source fared in a merge.
#[derive(Debug, Serialize)]
pub struct SourceReport {
    /// Source id.
    pub source_id: String,
    /// Source display name.
    pub name: String,
    /// Number of events the source contributed.
    pub event_count: usize,
    /// Whether the events came from the fallback cache.
    pub from_cache: bool,
    /// Why the live fetch failed, if it did.
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ProviderError>,
}

impl SourceReport {
    /// Returns true if the source's live fetch failed.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<ProviderError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

/// The merged, start-ordered events of every source.
#[derive(Debug, Serialize)]
pub struct MergedFeed {
    /// Events sorted by start. Equal starts keep source order.
    pub events: Vec<Event>,
    /// One report per configured source, in source order.
    pub reports: Vec<SourceReport>,
}

impl MergedFeed {
    /// Returns the reports of sources whose live fetch failed.
    pub fn degraded(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.is_degraded())
    }
}

/// Fetches every configured source and merges the results.
pub struct AggregationEngine {
    registry: Arc<SourceRegistry>,
    store: Arc<dyn ConfigStore>,
    fetch_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    span: Span,
}

impl AggregationEngine {
    /// Creates an engine over the sources listed by `store`.
    pub fn new(registry: Arc<SourceRegistry>, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            registry,
            store,
            fetch_locks: Mutex::new(HashMap::new()),
            span: component_span("aggregation_engine"),
        }
    }

    /// Records engine activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the merged events of every source for the next `window_days`.
    pub async fn get_merged_feed(&self, window_days: i64) -> ServerResult<Vec<Event>> {
        Ok(self.merged_feed(window_days).await?.events)
    }

    /// Like [`get_merged_feed`](Self::get_merged_feed), with a report per source.
    ///
    /// Only failing to list the configured sources is an error.
    pub async fn merged_feed(&self, window_days: i64) -> ServerResult<MergedFeed> {
        let sources = self.store.list_sources()?;
        self.prune_locks(&sources);
        let span = tracing::debug_span!(
            parent: &self.span,
            "merge",
            sources = sources.len(),
            days = window_days
        );

        let fetches = sources
            .iter()
            .map(|config| self.fetch_source(config, window_days));
        let results = join_all(fetches).instrument(span.clone()).await;

        let mut events = Vec::new();
        let mut reports = Vec::with_capacity(results.len());
        for (report, source_events) in results {
            events.extend(source_events);
            reports.push(report);
        }
        sort_by_start(&mut events);

        let feed = MergedFeed { events, reports };
        info!(
            parent: &span,
            events = feed.events.len(),
            degraded = feed.degraded().count(),
            "merged feed"
        );
        Ok(feed)
    }

    async fn fetch_source(
        &self,
        config: &SourceConfig,
        window_days: i64,
    ) -> (SourceReport, Vec<Event>) {
        let source = match self.registry.resolve(&config.provider_kind) {
            Ok(source) => source,
            Err(e) => {
                let e = e.with_source_id(&config.id);
                warn!(source = %config.id, error = %e, "skipping source");
                return (report(config, 0, false, Some(e)), Vec::new());
            }
        };

        let lock = self.fetch_lock(&config.id);
        let _guard = lock.lock().await;

        let outcome = source.fetch_events(config, window_days).await;
        let from_cache = outcome.from_cache;
        let (batch, error) = outcome.into_parts();
        debug!(
            source = %config.id,
            events = batch.event_count,
            degraded = error.is_some(),
            "fetched source"
        );

        let events = batch.into_events();
        (report(config, events.len(), from_cache, error), events)
    }

    fn fetch_lock(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .fetch_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(id.to_string()).or_default().clone()
    }

    /// Forgets the locks of sources that are no longer configured and
    /// not being fetched.
    fn prune_locks(&self, sources: &[SourceConfig]) {
        let mut locks = self
            .fetch_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.retain(|id, lock| {
            Arc::strong_count(lock) > 1 || sources.iter().any(|config| &config.id == id)
        });
    }
}

fn report(
    config: &SourceConfig,
    event_count: usize,
    from_cache: bool,
    error: Option<ProviderError>,
) -> SourceReport {
    SourceReport {
        source_id: config.id.clone(),
        name: config.display_name.clone(),
        event_count,
        from_cache,
        error,
    }
}

/// Sorts `events` by start, keeping the relative order of equal starts.
pub fn sort_by_start(events: &mut [Event]) {
    events.sort_by_key(|event| event.start);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::MemoryConfigStore;
    use calmux_core::{EventBatch, NewSource, SourceEdits};
    use calmux_providers::{BoxFuture, CalendarSource, FetchOutcome, ProviderResult};
    use chrono::{Local, TimeZone};

    struct EmptySource;

    impl CalendarSource for EmptySource {
        fn kind(&self) -> &str {
            "Stub"
        }

        fn fetch_events<'a>(
            &'a self,
            _source: &'a SourceConfig,
            window_days: i64,
        ) -> BoxFuture<'a, FetchOutcome> {
            Box::pin(async move { FetchOutcome::fresh(EventBatch::empty(window_days)) })
        }

        fn validate_new<'a>(
            &'a self,
            _id: String,
            _input: &'a NewSource,
        ) -> BoxFuture<'a, ProviderResult<SourceConfig>> {
            Box::pin(async { Err(ProviderError::configuration("read only")) })
        }

        fn validate_update(
            &self,
            existing: &SourceConfig,
            _edits: &SourceEdits,
        ) -> ProviderResult<SourceConfig> {
            Ok(existing.clone())
        }
    }

    fn tracked_locks(engine: &AggregationEngine) -> Vec<String> {
        let mut ids: Vec<_> = engine.fetch_locks.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn locks_of_removed_sources_are_dropped() {
        let store = Arc::new(MemoryConfigStore::new(vec![
            SourceConfig::new("a", "A", "Stub", "red"),
            SourceConfig::new("b", "B", "Stub", "blue"),
        ]));
        let registry = Arc::new(SourceRegistry::new().with_source(Arc::new(EmptySource)));
        let engine = AggregationEngine::new(registry, store.clone());

        engine.merged_feed(1).await.unwrap();
        assert_eq!(tracked_locks(&engine), vec!["a", "b"]);

        store
            .persist(&[SourceConfig::new("b", "B", "Stub", "blue")])
            .unwrap();
        engine.merged_feed(1).await.unwrap();
        assert_eq!(tracked_locks(&engine), vec!["b"]);
    }

    fn event(source: &SourceConfig, uid: &str, hour: u32) -> Event {
        let start = Local.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap();
        Event::new(source, uid, start, start + chrono::Duration::minutes(30))
    }

    #[test]
    fn sort_is_stable_on_equal_starts() {
        let a = SourceConfig::new("a", "A", "Stub", "red");
        let b = SourceConfig::new("b", "B", "Stub", "blue");
        let mut events = vec![event(&a, "a1", 10), event(&b, "b1", 9), event(&b, "b2", 10)];

        sort_by_start(&mut events);

        let uids: Vec<_> = events.iter().map(|e| e.uid.as_str()).collect();
        assert_eq!(uids, vec!["b1", "a1", "b2"]);
    }

    #[test]
    fn report_serializes_error_as_text() {
        let config = SourceConfig::new("a", "A", "Stub", "red");
        let report = report(&config, 0, true, Some(ProviderError::network("down")));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"], "network error: down");
        assert_eq!(json["from_cache"], true);
    }
}
