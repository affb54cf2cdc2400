//! Normalized events and event batches.
//!
//! An [`Event`] is the common record every calendar source produces. Its
//! display labels (`dayName`, `time`, `duration`) are derived once, at
//! construction, from the local start and end times.
//!
//! An [`EventBatch`] is the result of one fetch of one source. It is also
//! the record persisted as that source's fallback snapshot, so its serde
//! shape is the on-disk format:
//!
//! ```text
//! {createdAt, windowDays, eventCount,
//!  events: [{id, name, uid, start, end, dayName, time, duration,
//!            summary, location, description, colour}]}
//! ```

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::source::SourceConfig;
use crate::time::duration_label;

/// A calendar event normalized to local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Id of the source that produced this event.
    #[serde(rename = "id")]
    pub source_id: String,

    /// Display name of the source.
    pub name: String,

    /// Provider-assigned event identifier, empty if the provider has none.
    #[serde(default)]
    pub uid: String,

    /// Start time, local time zone.
    pub start: DateTime<Local>,

    /// End time, local time zone. Never before `start`.
    pub end: DateTime<Local>,

    /// Weekday name of `start` (e.g. "Monday").
    pub day_name: String,

    /// Start time of day, `HH:MM`.
    #[serde(rename = "time")]
    pub time_label: String,

    /// Length of the event, e.g. `"1h 30m"`.
    #[serde(rename = "duration")]
    pub duration_label: String,

    /// Event title.
    #[serde(default)]
    pub summary: String,

    /// Event location.
    #[serde(default)]
    pub location: String,

    /// Event description.
    #[serde(default)]
    pub description: String,

    /// Display colour of the source.
    pub colour: String,
}

impl Event {
    /// Creates an event for `source`, deriving the display labels.
    ///
    /// An `end` before `start` is clamped to `start`.
    pub fn new(
        source: &SourceConfig,
        uid: impl Into<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Self {
        let end = end.max(start);
        Self {
            source_id: source.id.clone(),
            name: source.display_name.clone(),
            uid: uid.into(),
            day_name: start.format("%A").to_string(),
            time_label: start.format("%H:%M").to_string(),
            duration_label: duration_label(&start, &end),
            start,
            end,
            summary: String::new(),
            location: String::new(),
            description: String::new(),
            colour: source.colour.clone(),
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// The events of one source from one fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBatch {
    /// When the batch was produced.
    pub created_at: DateTime<Local>,
    /// Window length, in days, the batch was fetched for.
    pub window_days: i64,
    /// Number of events in the batch.
    pub event_count: usize,
    /// Events, in provider order.
    pub events: Vec<Event>,
}

impl EventBatch {
    /// Creates a batch stamped with the current time.
    pub fn new(window_days: i64, events: Vec<Event>) -> Self {
        Self {
            created_at: Local::now(),
            window_days,
            event_count: events.len(),
            events,
        }
    }

    /// Creates an empty batch.
    pub fn empty(window_days: i64) -> Self {
        Self::new(window_days, Vec::new())
    }

    /// Returns true if the batch holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consumes the batch, returning its events.
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn source() -> SourceConfig {
        SourceConfig::new("src-1", "Holidays", "iCal", "#ff0000")
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 2, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn new_event_derives_labels() {
        let event = Event::new(&source(), "evt-1", at(10, 10, 0), at(10, 11, 30));

        assert_eq!(event.source_id, "src-1");
        assert_eq!(event.name, "Holidays");
        assert_eq!(event.colour, "#ff0000");
        assert_eq!(event.day_name, "Monday");
        assert_eq!(event.time_label, "10:00");
        assert_eq!(event.duration_label, "1h 30m");
    }

    #[test]
    fn inverted_end_is_clamped() {
        let event = Event::new(&source(), "evt-1", at(10, 10, 0), at(10, 9, 0));
        assert_eq!(event.end, event.start);
        assert_eq!(event.duration_label, "");
    }

    #[test]
    fn batch_counts_events() {
        let events = vec![
            Event::new(&source(), "a", at(10, 9, 0), at(10, 10, 0)),
            Event::new(&source(), "b", at(11, 9, 0), at(11, 10, 0)),
        ];
        let batch = EventBatch::new(7, events);

        assert_eq!(batch.window_days, 7);
        assert_eq!(batch.event_count, 2);
        assert!(!batch.is_empty());
        assert!(EventBatch::empty(7).is_empty());
    }

    #[test]
    fn persisted_shape() {
        let event = Event::new(&source(), "evt-1@example.com", at(10, 10, 0), at(10, 11, 30))
            .with_summary("Public holiday");
        let batch = EventBatch::new(4, vec![event]);

        insta::assert_json_snapshot!(batch, {
            ".createdAt" => "[created]",
            ".events[].start" => "[start]",
            ".events[].end" => "[end]",
        }, @r###"
        {
          "createdAt": "[created]",
          "windowDays": 4,
          "eventCount": 1,
          "events": [
            {
              "id": "src-1",
              "name": "Holidays",
              "uid": "evt-1@example.com",
              "start": "[start]",
              "end": "[end]",
              "dayName": "Monday",
              "time": "10:00",
              "duration": "1h 30m",
              "summary": "Public holiday",
              "location": "",
              "description": "",
              "colour": "#ff0000"
            }
          ]
        }
        "###);
    }

    #[test]
    fn json_roundtrip_keeps_instants() {
        let event = Event::new(&source(), "evt-1", at(10, 10, 0), at(10, 11, 0))
            .with_location("Town square")
            .with_description("Parade");
        let batch = EventBatch::new(4, vec![event]);

        let json = serde_json::to_string(&batch).unwrap();
        let parsed: EventBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, batch);
        assert_eq!(parsed.event_count, 1);
    }
}
