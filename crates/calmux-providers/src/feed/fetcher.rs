//! Feed download.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{trace, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::source::BoxFuture;

/// Downloads the raw bytes of a feed document.
pub trait FeedFetcher: Send + Sync {
    /// Fetches the document at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProviderResult<Vec<u8>>>;
}

/// [`FeedFetcher`] over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("calmux/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFeedFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ProviderResult<Vec<u8>>> {
        Box::pin(async move {
            trace!(url = %url, "downloading feed");
            let response = self.client.get(url).send().await.map_err(|e| {
                ProviderError::network(format!("Request to {url} failed: {e}")).with_cause(e)
            })?;

            let status = response.status();
            match status {
                StatusCode::OK => {
                    let body = response.bytes().await.map_err(|e| {
                        ProviderError::network(format!("Failed to read {url}: {e}"))
                    })?;
                    trace!(url = %url, bytes = body.len(), "downloaded feed");
                    Ok(body.to_vec())
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(
                    ProviderError::authentication(format!("Access to {url} denied ({status})")),
                ),
                s => {
                    warn!(url = %url, status = %s, "unexpected feed response");
                    Err(ProviderError::network(format!(
                        "Unexpected status {s} from {url}"
                    )))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetcher_creation() {
        assert!(HttpFeedFetcher::new(Duration::from_secs(5)).is_ok());
    }
}
