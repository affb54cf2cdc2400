//! Wiring of the sources, engine and manager from [`Settings`].

use std::sync::Arc;

use tracing::{Span, debug};

use calmux_core::child_span;
use calmux_providers::{
    CredentialStore, FallbackCache, FeedCalendarSource, FileCredentialStore, FileFallbackCache,
    HttpFeedFetcher, IcsFeedParser, SourceRegistry, google_source,
};
use calmux_server::{AggregationEngine, ConfigStore, JsonConfigStore, SourceManager};

use crate::config::Settings;
use crate::error::ClientResult;

/// The assembled services a command runs against.
pub struct App {
    /// Merged feed across sources.
    pub engine: AggregationEngine,
    /// Source list management.
    pub manager: SourceManager,
    /// Registered provider tags.
    pub kinds: Vec<String>,
    /// Parent of every component span.
    pub span: Span,
}

impl App {
    /// Builds every service from `settings`.
    ///
    /// The feed variant is always registered. The Google variant is
    /// registered only when a `[google]` section is configured.
    pub fn build(settings: &Settings) -> ClientResult<Self> {
        let data_dir = settings.data_dir();
        let timeout = settings.fetch_timeout();
        let span = tracing::info_span!("app", data_dir = %data_dir.display());
        debug!(parent: &span, "building services");

        let cache: Arc<dyn FallbackCache> = Arc::new(
            FileFallbackCache::new(&data_dir).with_span(child_span(&span, "fallback_cache")),
        );
        let credentials: Arc<dyn CredentialStore> = Arc::new(
            FileCredentialStore::new(&data_dir).with_span(child_span(&span, "credential_store")),
        );
        let store: Arc<dyn ConfigStore> = Arc::new(JsonConfigStore::in_dir(&data_dir));

        let mut registry = SourceRegistry::new().with_span(child_span(&span, "source_registry"));
        registry.register(Arc::new(
            FeedCalendarSource::new(
                Arc::new(HttpFeedFetcher::new(timeout)?),
                Arc::new(IcsFeedParser),
                Arc::clone(&cache),
            )
            .with_timeout(timeout)
            .with_span(child_span(&span, "feed_source")),
        ));
        if let Some(google) = &settings.google {
            let config = google.to_provider_config(timeout)?;
            registry.register(Arc::new(google_source(
                config,
                Arc::clone(&credentials),
                Arc::clone(&cache),
                &span,
            )?));
        }

        let kinds = registry.kinds().into_iter().map(str::to_string).collect();
        let registry = Arc::new(registry);

        Ok(Self {
            engine: AggregationEngine::new(Arc::clone(&registry), Arc::clone(&store))
                .with_span(child_span(&span, "engine")),
            manager: SourceManager::new(registry, store)
                .with_span(child_span(&span, "source_manager")),
            kinds,
            span,
        })
    }
}
