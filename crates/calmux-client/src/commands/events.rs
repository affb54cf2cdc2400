//! `calmux events`.

use tracing::info;

use calmux_server::AggregationEngine;

use crate::commands::Output;
use crate::error::ClientResult;
use crate::output::{OutputFormat, format_degraded, format_events};

/// Fetches the merged feed for `window_days` and renders it.
///
/// Sources that could not be fetched live are reported as warnings; their
/// cached events, if any, are part of the feed.
pub async fn run(
    engine: &AggregationEngine,
    window_days: i64,
    format: OutputFormat,
) -> ClientResult<Output> {
    let feed = engine.merged_feed(window_days).await?;
    info!(
        events = feed.events.len(),
        sources = feed.reports.len(),
        "rendering merged feed"
    );

    Ok(Output {
        stdout: format_events(&feed.events, format)?,
        warnings: feed.degraded().map(format_degraded).collect(),
    })
}
