//! RawEvent to Event conversion.
//!
//! Normalization binds a [`RawEvent`] to the [`SourceConfig`] that produced
//! it and moves its times into the local time zone. All-day dates become
//! local midnight.

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use calmux_core::{Event, SourceConfig, TimeWindow};

use crate::raw_event::{RawEvent, RawEventTime};

/// Converts a [`RawEvent`] into an [`Event`] of `source`.
///
/// Returns `None` when the event ends before it starts.
pub fn normalize_event(raw: &RawEvent, source: &SourceConfig) -> Option<Event> {
    let start = to_local(&raw.start);
    let end = to_local(&raw.end);
    if end < start {
        return None;
    }

    let mut event = Event::new(source, &raw.uid, start, end);
    if let Some(ref summary) = raw.summary {
        event = event.with_summary(summary.trim());
    }
    if let Some(ref location) = raw.location {
        event = event.with_location(location);
    }
    if let Some(ref description) = raw.description {
        event = event.with_description(description);
    }
    Some(event)
}

/// Normalizes the events of `raw_events` that start inside `window`.
///
/// Cancelled and inverted events are dropped. Input order is kept.
pub fn normalize_in_window(
    raw_events: &[RawEvent],
    source: &SourceConfig,
    window: &TimeWindow,
) -> Vec<Event> {
    raw_events
        .iter()
        .filter(|raw| !raw.is_cancelled())
        .filter_map(|raw| normalize_event(raw, source))
        .filter(|event| window.contains(&event.start))
        .collect()
}

fn to_local(raw: &RawEventTime) -> DateTime<Local> {
    match raw {
        RawEventTime::DateTime(dt) => dt.with_timezone(&Local),
        RawEventTime::Date(date) => local_midnight(*date),
    }
}

fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        // Midnight skipped by a DST jump: fall back to the UTC instant.
        .unwrap_or_else(|| midnight.and_utc().with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn source() -> SourceConfig {
        SourceConfig::new("src-1", "Work", "Google", "#0000ff")
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 5, h, m, 0).unwrap()
    }

    fn timed(uid: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> RawEvent {
        RawEvent::new(
            uid,
            RawEventTime::from_datetime(start),
            RawEventTime::from_datetime(end),
        )
    }

    #[test]
    fn maps_fields_and_source() {
        let raw = timed("evt-1", utc(10, 0), utc(11, 0))
            .with_summary("  Standup ")
            .with_location("Room 101")
            .with_description("Daily");

        let event = normalize_event(&raw, &source()).unwrap();

        assert_eq!(event.uid, "evt-1");
        assert_eq!(event.source_id, "src-1");
        assert_eq!(event.name, "Work");
        assert_eq!(event.colour, "#0000ff");
        assert_eq!(event.summary, "Standup");
        assert_eq!(event.location, "Room 101");
        assert_eq!(event.description, "Daily");
        assert_eq!(event.start, utc(10, 0).with_timezone(&Local));
        assert_eq!(event.duration_label, "1h");
    }

    #[test]
    fn all_day_starts_at_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 5).unwrap();
        let raw = RawEvent::new(
            "holiday",
            RawEventTime::from_date(date),
            RawEventTime::from_date(date.succ_opt().unwrap()),
        );

        let event = normalize_event(&raw, &source()).unwrap();

        assert_eq!(event.start.date_naive(), date);
        assert_eq!(event.time_label, "00:00");
    }

    #[test]
    fn inverted_event_is_dropped() {
        let raw = timed("evt-1", utc(11, 0), utc(10, 0));
        assert!(normalize_event(&raw, &source()).is_none());
    }

    #[test]
    fn window_filter_keeps_start_at_now() {
        let now = utc(9, 0);
        let window = TimeWindow::days_from(now, 1);
        let raw = vec![
            timed("at-now", now, now + Duration::minutes(30)),
            timed("before", now - Duration::minutes(1), now + Duration::hours(1)),
            timed("inside", utc(15, 0), utc(16, 0)),
            timed("at-end", now + Duration::days(1), now + Duration::days(1)),
            timed("cancelled", utc(12, 0), utc(13, 0)).with_status("cancelled"),
        ];

        let uids: Vec<_> = normalize_in_window(&raw, &source(), &window)
            .into_iter()
            .map(|e| e.uid)
            .collect();

        assert_eq!(uids, vec!["at-now", "inside"]);
    }
}
