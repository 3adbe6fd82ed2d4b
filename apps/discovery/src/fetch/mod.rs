//! Page fetching: the single way extractors reach the network.
//!
//! Extractors receive raw HTML plus the final URL and parse it synchronously, so
//! no parsed document is ever held across an await point.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

pub use http::HttpPageFetcher;

pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("page load exceeded {0:?}")]
    Timeout(Duration),

    #[error("gave up after {retries} retries")]
    RetriesExhausted { retries: u32 },
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hard limit for the page load.
    pub timeout: Duration,
    /// Wait after load before the DOM is read, for pages that render client-side.
    /// Advisory for non-rendering fetchers: [`HttpPageFetcher`] ignores it.
    pub settle_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            settle_delay: Duration::ZERO,
        }
    }
}

impl FetchOptions {
    pub fn rendered(timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            timeout,
            settle_delay,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it.
    pub url: Url,
    pub html: String,
}

/// Fetches one page. Implementations own their session for the duration of the
/// call and release it on every exit path.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchedPage, FetchError>;
}
