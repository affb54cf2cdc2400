//! Fetch windows and event labels.
//!
//! A [`TimeWindow`] is the forward-looking span `[now, now + days)` over
//! which a source is asked for events. The label helpers derive the
//! display strings carried by every [`Event`](crate::Event).

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Window length used when a caller asks for zero or negative days.
pub const DEFAULT_WINDOW_DAYS: i64 = 4;

/// Replaces a non-positive day count with [`DEFAULT_WINDOW_DAYS`].
pub fn effective_window_days(requested: i64) -> i64 {
    if requested <= 0 {
        DEFAULT_WINDOW_DAYS
    } else {
        requested
    }
}

/// A half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates the window `[now, now + days * 24h)`.
    ///
    /// Negative day counts collapse to an empty window at `now`. A window
    /// reaching past the last representable instant ends there.
    pub fn days_from(now: DateTime<Utc>, days: i64) -> Self {
        let end = days
            .max(0)
            .checked_mul(24)
            .and_then(Duration::try_hours)
            .and_then(|span| now.checked_add_signed(span))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(now, end)
    }

    /// Returns the length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `dt` lies inside the window (start inclusive, end exclusive).
    pub fn contains<Tz: TimeZone>(&self, dt: &DateTime<Tz>) -> bool {
        let dt = dt.with_timezone(&Utc);
        self.start <= dt && dt < self.end
    }
}

/// Renders the length of an event as `"<H>h <M>m"`.
///
/// Hours are whole hours between `start` and `end`, minutes the remainder.
/// Zero parts are omitted, so a one hour event is `"1h"`, a half hour event
/// `"30m"` and a zero length (or inverted) event the empty string.
pub fn duration_label<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> String {
    let total_minutes = end.clone().signed_duration_since(start.clone()).num_minutes();
    if total_minutes <= 0 {
        return String::new();
    }

    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::with_capacity(2);
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes != 0 {
        parts.push(format!("{minutes}m"));
    }
    parts.join(" ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn local(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2018, 8, 19, h, m, 0).unwrap()
    }

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    mod window_days {
        use super::*;

        #[test]
        fn non_positive_falls_back_to_default() {
            assert_eq!(effective_window_days(0), 4);
            assert_eq!(effective_window_days(-3), 4);
        }

        #[test]
        fn positive_is_kept() {
            assert_eq!(effective_window_days(1), 1);
            assert_eq!(effective_window_days(14), 14);
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn days_from_spans_whole_days() {
            let now = utc(2025, 2, 5, 10, 0, 0);
            let window = TimeWindow::days_from(now, 3);
            assert_eq!(window.start, now);
            assert_eq!(window.end, utc(2025, 2, 8, 10, 0, 0));
            assert_eq!(window.duration(), Duration::hours(72));
        }

        #[test]
        fn negative_days_give_empty_window() {
            let now = utc(2025, 2, 5, 10, 0, 0);
            let window = TimeWindow::days_from(now, -1);
            assert_eq!(window.duration(), Duration::zero());
            assert!(!window.contains(&now));
        }

        #[test]
        fn huge_day_counts_saturate() {
            let now = utc(2025, 2, 5, 10, 0, 0);
            for days in [200_000_000, i64::MAX / 24 + 1, i64::MAX] {
                let window = TimeWindow::days_from(now, days);
                assert_eq!(window.start, now);
                assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
                assert!(window.contains(&utc(9999, 12, 31, 0, 0, 0)));
            }
        }

        #[test]
        fn contains_is_half_open() {
            let window = TimeWindow::days_from(utc(2025, 2, 5, 10, 0, 0), 1);

            assert!(window.contains(&utc(2025, 2, 5, 10, 0, 0)));
            assert!(window.contains(&utc(2025, 2, 6, 9, 59, 59)));
            assert!(!window.contains(&utc(2025, 2, 6, 10, 0, 0)));
            assert!(!window.contains(&utc(2025, 2, 5, 9, 59, 59)));
        }

        #[test]
        fn contains_compares_instants_across_zones() {
            let window = TimeWindow::days_from(utc(2025, 2, 5, 10, 0, 0), 1);
            let plus_two = chrono::FixedOffset::east_opt(2 * 3600).unwrap();
            let inside = plus_two.with_ymd_and_hms(2025, 2, 5, 12, 0, 0).unwrap();
            let before = plus_two.with_ymd_and_hms(2025, 2, 5, 11, 0, 0).unwrap();

            assert!(window.contains(&inside));
            assert!(!window.contains(&before));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn inverted_window_panics() {
            TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0));
        }
    }

    mod labels {
        use super::*;

        #[test]
        fn whole_hour() {
            assert_eq!(duration_label(&local(1, 0), &local(2, 0)), "1h");
        }

        #[test]
        fn minutes_only() {
            assert_eq!(duration_label(&local(1, 0), &local(1, 30)), "30m");
        }

        #[test]
        fn hours_and_minutes() {
            assert_eq!(duration_label(&local(1, 0), &local(2, 30)), "1h 30m");
        }

        #[test]
        fn zero_length_is_empty() {
            assert_eq!(duration_label(&local(1, 0), &local(1, 0)), "");
        }

        #[test]
        fn inverted_is_empty() {
            assert_eq!(duration_label(&local(2, 0), &local(1, 0)), "");
        }

        #[test]
        fn multi_day_counts_all_hours() {
            let start = utc(2025, 2, 5, 0, 0, 0);
            let end = utc(2025, 2, 6, 1, 15, 0);
            assert_eq!(duration_label(&start, &end), "25h 15m");
        }
    }
}
