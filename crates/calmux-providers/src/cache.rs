//! Per-source fallback snapshots.
//!
//! A [`FallbackCache`] holds the last successful [`EventBatch`] of every
//! source. Each save overwrites the previous snapshot wholesale; a source
//! whose live fetch fails is answered from here.

use std::path::PathBuf;

use tracing::{Span, debug};

use calmux_core::{EventBatch, component_span};

use crate::error::ProviderResult;
use crate::fs::{file_key, read_json, remove_file, write_json_atomic};

/// Durable store of the latest successful batch per source.
pub trait FallbackCache: Send + Sync {
    /// Returns the snapshot of `source_id`, or `None` if there is none.
    fn load(&self, source_id: &str) -> ProviderResult<Option<EventBatch>>;

    /// Replaces the snapshot of `source_id` with `batch`.
    fn save(&self, source_id: &str, batch: &EventBatch) -> ProviderResult<()>;

    /// Drops the snapshot of a removed source. Having none is not an error.
    fn delete(&self, source_id: &str) -> ProviderResult<()>;
}

/// Fallback cache storing one `lastevents_<id>.json` file per source.
#[derive(Debug)]
pub struct FileFallbackCache {
    dir: PathBuf,
    span: Span,
}

impl FileFallbackCache {
    /// Creates a cache rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            span: component_span("fallback_cache"),
        }
    }

    /// Records cache activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Returns the snapshot path of `source_id`.
    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.dir
            .join(format!("lastevents_{}.json", file_key(source_id)))
    }
}

impl FallbackCache for FileFallbackCache {
    fn load(&self, source_id: &str) -> ProviderResult<Option<EventBatch>> {
        let _enter = self.span.enter();
        let path = self.path_for(source_id);
        let batch: Option<EventBatch> =
            read_json(&path).map_err(|e| e.with_source_id(source_id))?;
        debug!(source = %source_id, found = batch.is_some(), "loaded fallback snapshot");
        Ok(batch)
    }

    fn save(&self, source_id: &str, batch: &EventBatch) -> ProviderResult<()> {
        let _enter = self.span.enter();
        let path = self.path_for(source_id);
        write_json_atomic(&path, batch, false).map_err(|e| e.with_source_id(source_id))?;
        debug!(source = %source_id, events = batch.event_count, "saved fallback snapshot");
        Ok(())
    }

    fn delete(&self, source_id: &str) -> ProviderResult<()> {
        let _enter = self.span.enter();
        remove_file(&self.path_for(source_id)).map_err(|e| e.with_source_id(source_id))?;
        debug!(source = %source_id, "deleted fallback snapshot");
        Ok(())
    }
}
