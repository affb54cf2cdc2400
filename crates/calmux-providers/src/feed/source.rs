//! Public iCal feed source.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{Instrument, Span, debug};
use url::Url;

use calmux_core::{
    Event, NewSource, SourceConfig, SourceEdits, TimeWindow, component_span,
};

use crate::cache::FallbackCache;
use crate::error::{ProviderError, ProviderResult};
use crate::fallback::fetch_with_fallback;
use crate::normalize::normalize_in_window;
use crate::source::{BoxFuture, CalendarSource, FetchOutcome, apply_common_edits, require};

use super::fetcher::FeedFetcher;
use super::ics::{FeedParser, FeedZone};

/// Provider tag of feed sources.
pub const FEED_KIND: &str = "iCal";

/// A source made of one or more public iCal feeds.
///
/// The `url` of the source config holds the feed URLs, one per line. The
/// feeds are fetched in order and merged into one batch; an event whose uid
/// was already seen earlier in the same fetch is dropped. If any feed
/// fails, the whole fetch fails and the cached snapshot is used instead.
pub struct FeedCalendarSource {
    fetcher: Arc<dyn FeedFetcher>,
    parser: Arc<dyn FeedParser>,
    cache: Arc<dyn FallbackCache>,
    zone: FeedZone,
    timeout: Duration,
    span: Span,
}

impl FeedCalendarSource {
    /// Default bound on a single feed download.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a feed source variant.
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        parser: Arc<dyn FeedParser>,
        cache: Arc<dyn FallbackCache>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            cache,
            zone: FeedZone::Local,
            timeout: Self::DEFAULT_TIMEOUT,
            span: component_span("feed_source"),
        }
    }

    /// Sets the zone floating feed times are read in.
    pub fn with_zone(mut self, zone: FeedZone) -> Self {
        self.zone = zone;
        self
    }

    /// Sets the bound on a single feed download.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Records fetch activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    async fn collect(
        &self,
        source: &SourceConfig,
        window: &TimeWindow,
    ) -> ProviderResult<Vec<Event>> {
        let urls = source.feed_urls();
        if urls.is_empty() {
            return Err(ProviderError::configuration("Url must be specified"));
        }

        let mut seen = HashSet::new();
        let mut events = Vec::new();
        for url in urls {
            let body = tokio::time::timeout(self.timeout, self.fetcher.fetch(url))
                .await
                .map_err(|_| ProviderError::timeout("feed download", self.timeout))??;
            let raw = self.parser.parse(&body, self.zone)?;

            let before = events.len();
            for event in normalize_in_window(&raw, source, window) {
                if event.uid.is_empty() || seen.insert(event.uid.clone()) {
                    events.push(event);
                }
            }
            debug!(url = %url, parsed = raw.len(), kept = events.len() - before, "merged feed");
        }
        Ok(events)
    }
}

impl CalendarSource for FeedCalendarSource {
    fn kind(&self) -> &str {
        FEED_KIND
    }

    fn fetch_events<'a>(
        &'a self,
        source: &'a SourceConfig,
        window_days: i64,
    ) -> BoxFuture<'a, FetchOutcome> {
        let days = if window_days <= 0 {
            self.default_window_days()
        } else {
            window_days
        };
        let span = tracing::debug_span!(parent: &self.span, "fetch", source = %source.id, days);

        Box::pin(
            async move {
                let window = TimeWindow::days_from(Utc::now(), days);
                fetch_with_fallback(
                    self.cache.as_ref(),
                    source,
                    days,
                    self.collect(source, &window),
                )
                .await
            }
            .instrument(span),
        )
    }

    fn validate_new<'a>(
        &'a self,
        id: String,
        input: &'a NewSource,
    ) -> BoxFuture<'a, ProviderResult<SourceConfig>> {
        Box::pin(async move {
            let name = require(&input.display_name, "Name")?;
            let colour = require(&input.colour, "Colour")?;
            let url = validate_urls(input.url.as_deref().unwrap_or_default())?;
            Ok(SourceConfig::new(id, name, FEED_KIND, colour).with_url(url))
        })
    }

    fn validate_update(
        &self,
        existing: &SourceConfig,
        edits: &SourceEdits,
    ) -> ProviderResult<SourceConfig> {
        let mut updated = apply_common_edits(existing, edits)?;
        let url = edits
            .url
            .as_deref()
            .or(existing.url.as_deref())
            .unwrap_or_default();
        updated.url = Some(validate_urls(url)?);
        Ok(updated)
    }

    fn on_removed<'a>(&'a self, source: &'a SourceConfig) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move { self.cache.delete(&source.id) }.instrument(self.span.clone()))
    }
}

/// Checks that `urls` holds at least one line and that every non-blank line
/// is an absolute http(s) URL. Returns the lines re-joined with `\n`.
fn validate_urls(urls: &str) -> ProviderResult<String> {
    let lines: Vec<&str> = urls
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        return Err(ProviderError::configuration("Url must be specified"));
    }

    for line in &lines {
        let parsed = Url::parse(line)
            .map_err(|e| ProviderError::configuration(format!("Invalid url '{line}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::configuration(format!(
                "Invalid url '{line}': only http and https feeds are supported"
            )));
        }
    }
    Ok(lines.join("\n"))
}
