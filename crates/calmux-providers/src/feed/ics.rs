//! iCalendar feed parsing.
//!
//! Converts an RFC 5545 document into [`RawEvent`]s. Times are resolved as
//! follows:
//!
//! - `...Z` values are UTC.
//! - `TZID=` values are resolved through the IANA database; an unknown zone
//!   name falls back to the requested zone.
//! - Floating values are read in the requested zone.
//! - `VALUE=DATE` values stay all-day dates (normalized to local midnight).

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, EventLike,
    EventStatus,
};
use tracing::{debug, trace};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime};

/// Time zone in which floating feed times are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedZone {
    /// The zone of the running process.
    #[default]
    Local,
    /// A named IANA zone.
    Named(Tz),
}

impl FeedZone {
    /// Parses an IANA zone name such as `"Europe/Paris"`.
    pub fn named(name: &str) -> ProviderResult<Self> {
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|_| ProviderError::configuration(format!("Unknown time zone '{name}'")))
    }

    /// Resolves a wall-clock time in this zone to an instant.
    ///
    /// Ambiguous times take the earlier instant; times skipped by a DST jump
    /// are read as UTC.
    pub fn resolve(&self, naive: &NaiveDateTime) -> DateTime<Utc> {
        let resolved = match self {
            Self::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        };
        resolved.unwrap_or_else(|| naive.and_utc())
    }
}

/// Turns a downloaded feed document into raw events.
pub trait FeedParser: Send + Sync {
    /// Parses `content`, reading floating times in `zone`.
    fn parse(&self, content: &[u8], zone: FeedZone) -> ProviderResult<Vec<RawEvent>>;
}

/// [`FeedParser`] for iCalendar documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsFeedParser;

impl FeedParser for IcsFeedParser {
    fn parse(&self, content: &[u8], zone: FeedZone) -> ProviderResult<Vec<RawEvent>> {
        let text = String::from_utf8_lossy(content);
        let text = text.trim_start_matches('\u{feff}');

        if !text.to_ascii_uppercase().contains("BEGIN:VCALENDAR") {
            return Err(ProviderError::parse("Feed is not an iCalendar document"));
        }

        let calendar = text
            .parse::<Calendar>()
            .map_err(|e| ProviderError::parse(format!("Failed to parse feed: {e}")))?;

        let events: Vec<RawEvent> = calendar
            .iter()
            .filter_map(|component| match component {
                CalendarComponent::Event(event) => parse_event(event, zone),
                _ => None,
            })
            .collect();

        debug!(events = events.len(), "parsed feed");
        Ok(events)
    }
}

fn parse_event(event: &icalendar::Event, zone: FeedZone) -> Option<RawEvent> {
    if matches!(event.get_status(), Some(EventStatus::Cancelled)) {
        trace!(uid = ?event.get_uid(), "skipping cancelled event");
        return None;
    }

    let start = convert_date_time(event.get_start()?, zone);
    let end = event
        .get_end()
        .map(|end| convert_date_time(end, zone))
        .unwrap_or(start);

    let mut raw = RawEvent::new(event.get_uid().unwrap_or_default(), start, end);
    if let Some(summary) = event.get_summary() {
        raw = raw.with_summary(summary);
    }
    if let Some(description) = event.get_description() {
        raw = raw.with_description(description);
    }
    if let Some(location) = event.get_location() {
        raw = raw.with_location(location);
    }
    Some(raw)
}

fn convert_date_time(value: DatePerhapsTime, zone: FeedZone) -> RawEventTime {
    match value {
        DatePerhapsTime::Date(date) => RawEventTime::from_date(date),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => RawEventTime::from_datetime(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => {
            RawEventTime::from_datetime(zone.resolve(&naive))
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let event_zone = tzid.parse::<Tz>().map(FeedZone::Named).unwrap_or(zone);
            RawEventTime::from_datetime(event_zone.resolve(&date_time))
        }
    }
}
