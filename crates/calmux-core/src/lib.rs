//! Core types: events, batches, source configs, time windows, tracing

pub mod event;
pub mod source;
pub mod time;
pub mod tracing;

pub use event::{Event, EventBatch};
pub use source::{NewSource, SourceConfig, SourceEdits, SourceName};
pub use time::{DEFAULT_WINDOW_DAYS, TimeWindow, duration_label, effective_window_days};
pub use tracing::{
    TracingConfig, TracingError, TracingOutputFormat, child_span, component_span, init_tracing,
};
