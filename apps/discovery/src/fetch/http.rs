use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::fetch::{FetchError, FetchOptions, FetchedPage, PageFetcher};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MAX_RETRIES: u32 = 2;
const BACKOFF_BASE_MS: u64 = 500;

/// Plain HTTP fetcher. Retries 429 and 5xx responses with exponential backoff.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await.map_err(|e| classify(e, timeout))?;

        Ok(FetchedPage {
            url: final_url,
            html,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url, options: &FetchOptions) -> Result<FetchedPage, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Fetch attempt {} for {} failed, retrying after {}ms...",
                    attempt,
                    url,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_once(url, options.timeout).await {
                Ok(page) => {
                    debug!("Fetched {} ({} bytes)", page.url, page.html.len());
                    // Static responses are complete on arrival, so settle_delay is not applied.
                    return Ok(page);
                }
                Err(e) if is_retryable(&e) => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(FetchError::RetriesExhausted {
            retries: MAX_RETRIES,
        }))
    }
}

/// 500ms, 1s, 2s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(BACKOFF_BASE_MS * (1 << attempt.saturating_sub(1)))
}

fn is_retryable(error: &FetchError) -> bool {
    match error {
        FetchError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        FetchError::Http(e) => e.is_connect(),
        FetchError::Timeout(_) | FetchError::RetriesExhausted { .. } => false,
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Http(error)
    }
}
