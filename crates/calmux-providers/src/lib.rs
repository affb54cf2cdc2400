//! Calendar source variants and their collaborators.
//!
//! This crate provides:
//!
//! - [`CalendarSource`] - The trait every provider variant implements
//! - [`FeedCalendarSource`] / [`AuthenticatedCalendarSource`] - The two variants
//! - [`FallbackCache`] - Last known-good batch per source
//! - [`CredentialStore`] - Stored OAuth credentials per source
//! - [`SourceRegistry`] - Provider tag lookup and config validation
//! - [`ProviderError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//!  Google API            iCal feed URLs
//!      │                       │
//!      ▼                       ▼
//! ┌──────────────┐     ┌──────────────────┐
//! │ Authorizer + │     │ FeedFetcher +    │
//! │ RemoteClient │     │ FeedParser       │
//! └──────┬───────┘     └────────┬─────────┘
//!        │      RawEvent        │
//!        ▼                      ▼
//! ┌─────────────────────────────────────┐
//! │ normalize_in_window + dedup (feeds) │
//! └──────────────────┬──────────────────┘
//!                    ▼
//!        fetch_with_fallback ◄──► FallbackCache
//!                    │
//!                    ▼
//!              FetchOutcome
//! ```

pub mod authenticated;
pub mod cache;
pub mod credentials;
pub mod error;
pub mod fallback;
pub mod feed;
mod fs;
pub mod google;
pub mod normalize;
pub mod raw_event;
pub mod registry;
pub mod source;

pub use authenticated::{AuthenticatedCalendarSource, CalendarAuthorizer, RemoteCalendarClient};
pub use cache::{FallbackCache, FileFallbackCache};
pub use credentials::{Credential, CredentialStore, FileCredentialStore};
pub use error::{ProviderError, ErrorKind, ProviderResult};
pub use fallback::fetch_with_fallback;
pub use fs::write_json_atomic;
pub use feed::{
    FEED_KIND, FeedCalendarSource, FeedFetcher, FeedParser, FeedZone, HttpFeedFetcher,
    IcsFeedParser,
};
pub use google::{GOOGLE_KIND, GoogleConfig, OAuthCredentials, google_source};
pub use normalize::{normalize_event, normalize_in_window};
pub use raw_event::{RawEvent, RawEventTime};
pub use registry::{DUPLICATE_COLOUR, DUPLICATE_NAME, SourceRegistry};
pub use source::{BoxFuture, CalendarSource, FetchOutcome, require};
