//! Calendar API v3 reader.
//!
//! Only `events.list` is used. The server expands recurrences
//! (`singleEvents=true`) and returns pages ordered by start time; pages are
//! followed until no `nextPageToken` is returned.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use calmux_core::TimeWindow;

use crate::authenticated::RemoteCalendarClient;
use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};
use crate::source::BoxFuture;

const EVENTS_ENDPOINT: &str = "https://www.googleapis.com/calendar/v3/calendars";

/// Reads one calendar with one access token.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    token: String,
    calendar_id: String,
}

/// Query string of one `events.list` call.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageQuery<'a> {
    time_min: String,
    time_max: String,
    single_events: bool,
    order_by: &'static str,
    show_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

impl GoogleCalendarClient {
    /// Creates a reader for `calendar_id`. Every request is bounded by `timeout`.
    pub fn new(
        token: impl Into<String>,
        calendar_id: impl Into<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::network(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token: token.into(),
            calendar_id: calendar_id.into(),
        })
    }

    async fn fetch_window(&self, window: &TimeWindow) -> ProviderResult<Vec<RawEvent>> {
        let mut events = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.fetch_page(window, cursor.as_deref()).await?;
            events.extend(page.items.into_iter().filter_map(GoogleEvent::into_raw));
            cursor = page.next_page_token;
            if cursor.is_none() {
                break;
            }
        }

        debug!(calendar = %self.calendar_id, count = events.len(), "listed Google events");
        Ok(events)
    }

    async fn fetch_page(
        &self,
        window: &TimeWindow,
        cursor: Option<&str>,
    ) -> ProviderResult<EventsPage> {
        let url = format!(
            "{EVENTS_ENDPOINT}/{}/events",
            urlencoding::encode(&self.calendar_id)
        );
        let query = PageQuery {
            time_min: window.start.to_rfc3339(),
            time_max: window.end.to_rfc3339(),
            single_events: true,
            order_by: "startTime",
            show_deleted: false,
            page_token: cursor,
        };

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await
            .map_err(request_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::authentication(format!(
                    "calendar {} refused the access token ({})",
                    self.calendar_id,
                    response.status()
                )));
            }
            status if !status.is_success() => {
                let detail = response.text().await.unwrap_or_default();
                return Err(ProviderError::network(format!(
                    "events.list returned {status}: {detail}"
                )));
            }
            _ => {}
        }

        let body = response.text().await.map_err(request_error)?;
        serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("unreadable events.list page: {e}")))
    }
}

impl RemoteCalendarClient for GoogleCalendarClient {
    fn list_events<'a>(
        &'a self,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawEvent>>> {
        Box::pin(self.fetch_window(window))
    }
}

fn request_error(e: reqwest::Error) -> ProviderError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "could not connect"
    } else {
        "failed"
    };
    ProviderError::network(format!("Google request {kind}: {e}"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<GoogleEvent>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleEvent {
    id: Option<String>,
    status: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(default)]
    start: GoogleTime,
    #[serde(default)]
    end: GoogleTime,
}

/// Either `dateTime` (timed) or `date` (all-day) is set.
#[derive(Debug, Default, Deserialize)]
struct GoogleTime {
    #[serde(rename = "dateTime")]
    instant: Option<String>,
    #[serde(rename = "date")]
    day: Option<String>,
}

impl GoogleEvent {
    /// Drops cancelled events and events whose times cannot be read.
    fn into_raw(self) -> Option<RawEvent> {
        if self.status.as_deref() == Some("cancelled") {
            return None;
        }

        let uid = self.id.unwrap_or_default();
        let start = self.start.read(&uid, "start")?;
        let end = self.end.read(&uid, "end")?;

        let mut raw = RawEvent::new(uid, start, end);
        raw.summary = self.summary;
        raw.description = self.description;
        raw.location = self.location;
        raw.status = self.status;
        Some(raw)
    }
}

impl GoogleTime {
    fn read(&self, uid: &str, bound: &str) -> Option<RawEventTime> {
        let parsed = if let Some(instant) = &self.instant {
            DateTime::parse_from_rfc3339(instant)
                .map(|t| RawEventTime::DateTime(t.with_timezone(&Utc)))
                .map_err(|e| e.to_string())
        } else if let Some(day) = &self.day {
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(RawEventTime::Date)
                .map_err(|e| e.to_string())
        } else {
            Err("missing".to_string())
        };

        parsed
            .map_err(|reason| warn!(event = %uid, bound, %reason, "skipping Google event"))
            .ok()
    }
}
