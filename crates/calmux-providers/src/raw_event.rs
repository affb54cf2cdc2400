//! Raw event type from calendar sources.
//!
//! [`RawEvent`] is the provider-agnostic shape of an event as it comes out of
//! a remote calendar API or a parsed feed, before it is normalized into an
//! [`Event`](calmux_core::Event) for a particular source.

use chrono::{DateTime, NaiveDate, Utc};

/// The start or end of a raw event.
///
/// Providers return either an exact instant or, for all-day events, a bare
/// date with no time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventTime {
    /// A specific instant.
    DateTime(DateTime<Utc>),
    /// An all-day event date.
    Date(NaiveDate),
}

impl RawEventTime {
    /// An exact instant.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// A whole day.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::Date(date)
    }

    /// Returns true for a bare date.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// One event as listed by a remote calendar or parsed from a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Provider-assigned identifier, empty if the provider has none.
    pub uid: String,

    /// Start.
    pub start: RawEventTime,

    /// End. Equal to `start` when the provider gave none.
    pub end: RawEventTime,

    /// Title.
    pub summary: Option<String>,

    /// Free text description.
    pub description: Option<String>,

    pub location: Option<String>,

    /// Provider status, `cancelled` events are never shown.
    pub status: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the required fields.
    pub fn new(uid: impl Into<String>, start: RawEventTime, end: RawEventTime) -> Self {
        Self {
            uid: uid.into(),
            start,
            end,
            summary: None,
            description: None,
            location: None,
            status: None,
        }
    }

    /// Returns true if the provider marked the event cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(&self.status, Some(status) if status.eq_ignore_ascii_case("cancelled"))
    }

    /// Returns true if the event starts on a bare date.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Sets the title.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the provider status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nine_am() -> DateTime<Utc> {
        "2026-03-02T09:00:00Z".parse().unwrap()
    }

    #[test]
    fn all_day_follows_start() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let event = RawEvent::new(
            "evt-1",
            RawEventTime::from_date(date),
            RawEventTime::from_date(date.succ_opt().unwrap()),
        );
        assert!(event.is_all_day());

        let timed = RawEvent::new(
            "evt-2",
            RawEventTime::from_datetime(nine_am()),
            RawEventTime::from_datetime(nine_am()),
        );
        assert!(!timed.is_all_day());
    }

    #[test]
    fn cancelled_status_is_case_insensitive() {
        let at = RawEventTime::from_datetime(nine_am());
        assert!(RawEvent::new("a", at, at).with_status("CANCELLED").is_cancelled());
        assert!(RawEvent::new("a", at, at).with_status("cancelled").is_cancelled());
        assert!(!RawEvent::new("a", at, at).with_status("confirmed").is_cancelled());
        assert!(!RawEvent::new("a", at, at).is_cancelled());
    }

    #[test]
    fn builder_sets_text_fields() {
        let at = RawEventTime::from_datetime(nine_am());
        let event = RawEvent::new("dentist@example.com", at, at)
            .with_summary("Dentist")
            .with_description("Check-up")
            .with_location("High Street 4");

        assert_eq!(event.summary.as_deref(), Some("Dentist"));
        assert_eq!(event.description.as_deref(), Some("Check-up"));
        assert_eq!(event.location.as_deref(), Some("High Street 4"));
    }
}
