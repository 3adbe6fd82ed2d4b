//! External job sites.
//!
//! Every site is described by a [`SourceConfig`] and driven by the one generic
//! [`SourceExtractor`]. The orchestrator only sees the [`JobSource`] trait, so
//! tests can plug in sources that fail or hang on purpose.

pub mod config;
pub mod details;
pub mod extractor;
pub mod registry;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::fetch::FetchError;
use crate::location::ParsedLocation;
use crate::models::{CandidateJob, ReferenceJob, Source};
use crate::text::extract_search_keywords;

pub use config::{FieldRule, RenderMode, SourceConfig};
pub use details::DetailScraper;
pub use extractor::SourceExtractor;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("invalid search URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("source task failed: {0}")]
    Task(String),
}

/// Search derived from a reference job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub keywords: Vec<String>,
    /// Omitted for remote searches.
    pub location: Option<String>,
    pub remote: bool,
}

impl SearchQuery {
    pub fn from_reference(job: &ReferenceJob) -> Self {
        let location = job
            .location
            .as_deref()
            .map(ParsedLocation::parse)
            .filter(|parsed| !parsed.raw.is_empty());
        let remote = location.as_ref().is_some_and(|parsed| parsed.is_remote);

        Self {
            keywords: extract_search_keywords(job),
            location: location.filter(|p| !p.is_remote).map(|p| p.raw),
            remote,
        }
    }

    /// The first `max_terms` keywords, space separated.
    pub fn text(&self, max_terms: usize) -> String {
        self.keywords
            .iter()
            .take(max_terms.max(1))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// What one source produced for one query.
#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    pub jobs: Vec<CandidateJob>,
    pub has_more: bool,
    pub error: Option<String>,
}

impl ScrapeResult {
    pub fn failed(error: &SourceError) -> Self {
        Self {
            jobs: Vec::new(),
            has_more: false,
            error: Some(error.to_string()),
        }
    }
}

#[async_trait]
pub trait JobSource: Send + Sync {
    fn source(&self) -> Source;

    /// Budget for one whole scrape, independent of any caller deadline.
    fn timeout(&self) -> Duration;

    async fn try_scrape(&self, query: &SearchQuery) -> Result<ScrapeResult, SourceError>;

    /// `try_scrape` raced against [`JobSource::timeout`].
    async fn scrape_within_budget(&self, query: &SearchQuery) -> Result<ScrapeResult, SourceError> {
        let budget = self.timeout();
        match tokio::time::timeout(budget, self.try_scrape(query)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(SourceError::Timeout(budget)),
        }
    }

    /// Never fails: errors and timeouts come back as an empty result with `error` set.
    async fn scrape(&self, query: &SearchQuery) -> ScrapeResult {
        self.scrape_within_budget(query).await.unwrap_or_else(|e| {
            warn!("Source {} unavailable: {e}", self.source());
            ScrapeResult::failed(&e)
        })
    }
}
