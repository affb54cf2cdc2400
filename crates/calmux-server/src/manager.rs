//! Validated add / update / remove of configured sources.
//!
//! Every mutation reads the whole source list, changes it and persists it
//! again. Mutations hold one async mutex for that whole sequence, so there
//! is a single writer at a time.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{Instrument, Span, info};

use calmux_core::{NewSource, SourceConfig, SourceEdits, SourceName, component_span};
use calmux_providers::SourceRegistry;

use crate::config_store::ConfigStore;
use crate::error::{ServerError, ServerResult};

/// Manages the configured source list.
pub struct SourceManager {
    registry: Arc<SourceRegistry>,
    store: Arc<dyn ConfigStore>,
    write_lock: Mutex<()>,
    span: Span,
}

impl SourceManager {
    /// Creates a manager persisting through `store`.
    pub fn new(registry: Arc<SourceRegistry>, store: Arc<dyn ConfigStore>) -> Self {
        Self {
            registry,
            store,
            write_lock: Mutex::new(()),
            span: component_span("source_manager"),
        }
    }

    /// Records manager activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns every configured source, in persisted order.
    pub fn list(&self) -> ServerResult<Vec<SourceConfig>> {
        self.store.list_sources()
    }

    /// Returns the source with `id`.
    pub fn get(&self, id: &str) -> ServerResult<SourceConfig> {
        self.list()?
            .into_iter()
            .find(|config| config.id == id)
            .ok_or_else(|| ServerError::not_found(id))
    }

    /// Returns the name and colour of every source, in order.
    pub fn names(&self) -> ServerResult<Vec<SourceName>> {
        Ok(self.list()?.iter().map(SourceName::from).collect())
    }

    /// Validates `input` and appends the new source.
    pub async fn add(&self, input: NewSource) -> ServerResult<SourceConfig> {
        let _guard = self.write_lock.lock().await;

        let mut sources = self.store.list_sources()?;
        let config = self
            .registry
            .validate_for_create(&input, &sources)
            .instrument(self.span.clone())
            .await?;

        sources.push(config.clone());
        if let Err(error) = self.store.persist(&sources) {
            // The variant may already hold state for the new id, such as a
            // stored credential. Nothing refers to that id any more.
            self.registry
                .on_removed(&config)
                .instrument(self.span.clone())
                .await;
            return Err(error);
        }

        info!(parent: &self.span, source = %config.id, kind = %config.provider_kind, "added source");
        Ok(config)
    }

    /// Validates `edits` and replaces the source with `id` in place.
    pub async fn update(&self, id: &str, edits: SourceEdits) -> ServerResult<SourceConfig> {
        let _guard = self.write_lock.lock().await;

        let mut sources = self.store.list_sources()?;
        let index = position(&sources, id)?;
        let updated = self
            .registry
            .validate_for_update(&sources[index], &edits, &sources)?;

        sources[index] = updated.clone();
        self.store.persist(&sources)?;

        info!(parent: &self.span, source = %id, "updated source");
        Ok(updated)
    }

    /// Removes the source with `id`, then lets its variant clean up.
    ///
    /// Cleanup failures are logged; the source is gone either way.
    pub async fn remove(&self, id: &str) -> ServerResult<SourceConfig> {
        let _guard = self.write_lock.lock().await;

        let mut sources = self.store.list_sources()?;
        let index = position(&sources, id)?;
        let removed = sources.remove(index);
        self.store.persist(&sources)?;

        self.registry
            .on_removed(&removed)
            .instrument(self.span.clone())
            .await;

        info!(parent: &self.span, source = %id, "removed source");
        Ok(removed)
    }
}

fn position(sources: &[SourceConfig], id: &str) -> ServerResult<usize> {
    sources
        .iter()
        .position(|config| config.id == id)
        .ok_or_else(|| ServerError::not_found(id))
}
