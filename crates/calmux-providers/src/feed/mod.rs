//! iCal feed sources.
//!
//! A [`FeedCalendarSource`] downloads public iCalendar documents through a
//! [`FeedFetcher`] and turns them into raw events with a [`FeedParser`].
//! The default collaborators are [`HttpFeedFetcher`] and [`IcsFeedParser`].
//!
//! # Example
//!
//! ```ignore
//! use calmux_providers::feed::{FeedCalendarSource, HttpFeedFetcher, IcsFeedParser};
//!
//! let fetcher = HttpFeedFetcher::new(Duration::from_secs(30))?;
//! let source = FeedCalendarSource::new(Arc::new(fetcher), Arc::new(IcsFeedParser), cache);
//! let outcome = source.fetch_events(&config, 7).await;
//! ```

mod fetcher;
mod ics;
mod source;

pub use fetcher::{FeedFetcher, HttpFeedFetcher};
pub use ics::{FeedParser, FeedZone, IcsFeedParser};
pub use source::{FEED_KIND, FeedCalendarSource};
