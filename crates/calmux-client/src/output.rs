//! Terminal and JSON rendering.

use calmux_core::{Event, SourceConfig, SourceName};
use calmux_server::SourceReport;

use crate::error::ClientResult;

/// Title shown for events without a summary.
const UNTITLED: &str = "(no title)";

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One line per item.
    #[default]
    Tty,
    /// Pretty printed JSON.
    Json,
}

impl OutputFormat {
    /// Returns [`Json`](Self::Json) when `json` is set.
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Tty }
    }
}

/// Renders one event as `<day> <time> (<duration>) <summary> [<source>]`.
///
/// The duration is left out for zero-length events.
pub fn format_event_line(event: &Event) -> String {
    let summary = if event.summary.is_empty() {
        UNTITLED
    } else {
        &event.summary
    };
    let mut line = format!("{} {}", event.day_name, event.time_label);
    if !event.duration_label.is_empty() {
        line.push_str(&format!(" ({})", event.duration_label));
    }
    line.push_str(&format!(" {} [{}]", summary, event.name));
    line
}

/// Renders the merged events.
pub fn format_events(events: &[Event], format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(events)?),
        OutputFormat::Tty => Ok(lines(events.iter().map(format_event_line))),
    }
}

/// Renders the warning printed for a source whose live fetch failed.
pub fn format_degraded(report: &SourceReport) -> String {
    let cause = report
        .error
        .as_ref()
        .map(|e| e.message().to_string())
        .unwrap_or_default();
    if report.from_cache {
        format!(
            "warning: {} is unavailable ({}), showing {} cached events",
            report.name, cause, report.event_count
        )
    } else {
        format!("warning: {} is unavailable ({})", report.name, cause)
    }
}

/// Renders the configured sources.
pub fn format_sources(sources: &[SourceConfig], format: OutputFormat) -> ClientResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(sources)?),
        OutputFormat::Tty => Ok(lines(sources.iter().map(|source| {
            let mut line = format!(
                "{}  {} ({}, {})",
                source.id, source.display_name, source.provider_kind, source.colour
            );
            for url in source.feed_urls() {
                line.push_str(&format!("\n    {url}"));
            }
            line
        }))),
    }
}

/// Renders the name and colour legend.
pub fn format_names(names: &[SourceName]) -> String {
    lines(names.iter().map(|n| format!("{} {}", n.colour, n.name)))
}

fn lines(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join("\n")
}
