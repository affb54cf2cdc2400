//! Aggregation and source management for calmux.
//!
//! This crate provides:
//!
//! - [`AggregationEngine`] - Concurrent fetch of every source, merged by start
//! - [`ConfigStore`] - Persistence of the configured source list
//! - [`SourceManager`] - Validated add / update / remove of sources
//! - [`ServerError`] - Error types for the above

pub mod config_store;
pub mod engine;
pub mod error;
pub mod manager;

pub use config_store::{ConfigStore, JsonConfigStore, MemoryConfigStore};
pub use engine::{AggregationEngine, MergedFeed, SourceReport, sort_by_start};
pub use error::{ServerError, ServerResult};
pub use manager::SourceManager;
