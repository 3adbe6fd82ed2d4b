//! Top-level discovery: gather candidates from the catalog and every selected
//! source concurrently, then dedupe, score, sort and truncate.
//!
//! Output order depends only on scores and the fixed merge order (catalog
//! first, then sources in configured order), never on which source answered
//! first.

pub mod dedup;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::catalog::{create_pool, DatabaseCandidateProvider, JobRecords, PgCatalog};
use crate::config::Config;
use crate::errors::DiscoveryError;
use crate::fetch::{FetchOptions, HttpPageFetcher, PageFetcher};
use crate::location::{CachedGeocoder, Geocoder, LocationScorer, NominatimGeocoder};
use crate::models::{CandidateJob, PartialCandidateJob, ReferenceJob, Source};
use crate::similarity::SimilarityScorer;
use crate::sources::registry::config_for;
use crate::sources::{
    DetailScraper, JobSource, RenderMode, SearchQuery, SourceError, SourceExtractor,
};

pub use dedup::dedupe;

pub const DEFAULT_LIMIT: usize = 5;
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryStrategy {
    /// Answer from the catalog alone when it has anything, cancelling the
    /// external scrapes still in flight.
    #[default]
    DatabaseFirst,
    /// Always wait for every selected source.
    FanOut,
}

impl FromStr for DiscoveryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "database_first" | "db_first" => Ok(DiscoveryStrategy::DatabaseFirst),
            "fan_out" | "fanout" => Ok(DiscoveryStrategy::FanOut),
            other => Err(format!("unknown discovery strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub default_limit: usize,
    pub strategy: DiscoveryStrategy,
    pub catalog_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            strategy: DiscoveryStrategy::default(),
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok { jobs: usize, has_more: bool },
    Failed { error: String },
    TimedOut,
    /// Not selected for this request, or cancelled by the database-first path.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceOutcome {
    pub source: Source,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceOutcome {
    fn new(source: Source, status: SourceStatus) -> Self {
        Self { source, status }
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SourceStatus::Ok { jobs, .. } => write!(f, "{}: {jobs} jobs", self.source),
            SourceStatus::Failed { error } => write!(f, "{}: failed ({error})", self.source),
            SourceStatus::TimedOut => write!(f, "{}: timed out", self.source),
            SourceStatus::Skipped => write!(f, "{}: skipped", self.source),
        }
    }
}

/// Ranked candidates plus what happened at each source.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    pub candidates: Vec<CandidateJob>,
    /// Catalog first, then external sources in configured order.
    pub outcomes: Vec<SourceOutcome>,
}

impl DiscoveryReport {
    pub fn outcome(&self, source: Source) -> Option<&SourceStatus> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.source == source)
            .map(|outcome| &outcome.status)
    }
}

type SourceRun = (Vec<CandidateJob>, SourceOutcome);

pub struct DiscoveryEngine {
    records: Arc<dyn JobRecords>,
    catalog: Option<DatabaseCandidateProvider>,
    sources: Vec<Arc<dyn JobSource>>,
    scorer: SimilarityScorer,
    details: DetailScraper,
    options: DiscoveryOptions,
}

impl DiscoveryEngine {
    pub fn new(
        records: Arc<dyn JobRecords>,
        scorer: SimilarityScorer,
        details: DetailScraper,
    ) -> Self {
        Self {
            records,
            catalog: None,
            sources: Vec::new(),
            scorer,
            details,
            options: DiscoveryOptions::default(),
        }
    }

    pub fn with_catalog(mut self, provider: DatabaseCandidateProvider) -> Self {
        self.catalog = Some(provider);
        self
    }

    /// Sources are merged in the order they are added.
    pub fn with_source(mut self, source: Arc<dyn JobSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_options(mut self, options: DiscoveryOptions) -> Self {
        self.options = options;
        self
    }

    /// Wires the production stack: Postgres catalog, Nominatim geocoding (Redis
    /// cached when configured) and HTTP-fetched built-in sources.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let catalog = Arc::new(PgCatalog::new(create_pool(&config.database_url).await?));

        let nominatim =
            NominatimGeocoder::new(config.geocoder_url.clone(), &config.geocoder_user_agent)?;
        let geocoder: Arc<dyn Geocoder> = match &config.redis_url {
            Some(redis_url) => {
                let redis = redis::Client::open(redis_url.as_str())?;
                info!("Geocode cache enabled (ttl {}s)", config.geocode_cache_ttl_secs);
                Arc::new(CachedGeocoder::new(nominatim, redis, config.geocode_cache_ttl_secs))
            }
            None => Arc::new(nominatim),
        };

        let fetcher: Arc<dyn PageFetcher> =
            Arc::new(HttpPageFetcher::new(&config.scraper_user_agent)?);

        let mut engine = DiscoveryEngine::new(
            catalog.clone(),
            SimilarityScorer::new(LocationScorer::new(geocoder)),
            DetailScraper::new(
                fetcher.clone(),
                FetchOptions::rendered(config.page_load_timeout, config.settle_delay),
            ),
        )
        .with_catalog(
            DatabaseCandidateProvider::new(catalog).with_query_limit(config.catalog_query_limit),
        )
        .with_options(DiscoveryOptions {
            default_limit: config.default_limit,
            strategy: config.strategy,
            catalog_timeout: config.catalog_timeout,
        });

        for source_config in config.enabled_sources.iter().copied().filter_map(config_for) {
            let timeout = match source_config.render {
                RenderMode::Static => config.lightweight_source_timeout,
                RenderMode::Browser => config.browser_source_timeout,
            };
            let extractor =
                SourceExtractor::new(source_config.with_timeout(timeout), fetcher.clone())
                    .with_page_timing(config.page_load_timeout, config.settle_delay);
            engine = engine.with_source(Arc::new(extractor));
        }

        info!(
            "Discovery engine ready: {} sources, strategy {:?}",
            engine.sources.len(),
            engine.options.strategy
        );
        Ok(engine)
    }

    /// Resolves the requester's saved job and returns the most similar postings.
    pub async fn discover(
        &self,
        reference_job_id: Uuid,
        requester_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<CandidateJob>, DiscoveryError> {
        let reference = self
            .records
            .get_job_by_id(reference_job_id, requester_id)
            .await?
            .ok_or(DiscoveryError::ReferenceNotFound {
                job_id: reference_job_id,
            })?;

        Ok(self.discover_similar(&reference, limit, None).await.candidates)
    }

    /// `sources` restricts the request to the listed origins (`Source::Catalog`
    /// included); `None` uses everything configured.
    pub async fn discover_similar(
        &self,
        reference: &ReferenceJob,
        limit: Option<usize>,
        sources: Option<&[Source]>,
    ) -> DiscoveryReport {
        let limit = limit.unwrap_or(self.options.default_limit);
        let selected = |source: Source| sources.map_or(true, |list| list.contains(&source));

        info!(
            "Discovering jobs similar to '{}' at '{}' (limit {limit})",
            reference.title, reference.company
        );

        // One task per source, so a panic in one scraper cannot take its siblings down.
        let query = SearchQuery::from_reference(reference);
        let tasks: Vec<(Source, Option<JoinHandle<SourceRun>>)> = self
            .sources
            .iter()
            .map(|source| {
                let kind = source.source();
                let task = selected(kind)
                    .then(|| tokio::spawn(run_source(source.clone(), query.clone())));
                (kind, task)
            })
            .collect();

        let (catalog_jobs, catalog_outcome) = if selected(Source::Catalog) {
            self.run_catalog(reference).await
        } else {
            (Vec::new(), SourceOutcome::new(Source::Catalog, SourceStatus::Skipped))
        };

        // The catalog policy has no minimum score, so any catalog candidate survives scoring.
        if self.options.strategy == DiscoveryStrategy::DatabaseFirst && !catalog_jobs.is_empty() {
            let outcomes = std::iter::once(catalog_outcome)
                .chain(tasks.into_iter().map(|(kind, task)| {
                    if let Some(task) = task {
                        task.abort();
                    }
                    SourceOutcome::new(kind, SourceStatus::Skipped)
                }))
                .collect();
            debug!("Catalog answered; cancelled external sources");

            return DiscoveryReport {
                candidates: self.rank(reference, dedupe(catalog_jobs), limit).await,
                outcomes,
            };
        }

        // Joined in configured order; the tasks themselves run concurrently.
        let mut merged = catalog_jobs;
        let mut outcomes = vec![catalog_outcome];
        for (kind, task) in tasks {
            let Some(task) = task else {
                outcomes.push(SourceOutcome::new(kind, SourceStatus::Skipped));
                continue;
            };
            let (jobs, outcome) = match task.await {
                Ok(run) => run,
                Err(e) => {
                    let error = SourceError::Task(e.to_string());
                    warn!("Source {kind} failed: {error}");
                    let status = SourceStatus::Failed {
                        error: error.to_string(),
                    };
                    (Vec::new(), SourceOutcome::new(kind, status))
                }
            };
            merged.extend(jobs);
            outcomes.push(outcome);
        }

        let total = merged.len();
        let candidates = self.rank(reference, dedupe(merged), limit).await;
        info!("Discovery kept {} of {total} candidates", candidates.len());

        DiscoveryReport {
            candidates,
            outcomes,
        }
    }

    pub async fn scrape_job_details(&self, url: &str) -> Option<PartialCandidateJob> {
        self.details.scrape_job_details(url).await
    }

    async fn run_catalog(&self, reference: &ReferenceJob) -> SourceRun {
        let Some(provider) = &self.catalog else {
            return (Vec::new(), SourceOutcome::new(Source::Catalog, SourceStatus::Skipped));
        };

        let catalog_timeout = self.options.catalog_timeout;
        match tokio::time::timeout(catalog_timeout, provider.fetch_candidates(reference)).await {
            Ok(jobs) => {
                let status = SourceStatus::Ok {
                    jobs: jobs.len(),
                    has_more: false,
                };
                (jobs, SourceOutcome::new(Source::Catalog, status))
            }
            Err(_) => {
                warn!("Catalog timed out after {catalog_timeout:?}");
                (Vec::new(), SourceOutcome::new(Source::Catalog, SourceStatus::TimedOut))
            }
        }
    }

    /// Scores every candidate, drops those under their policy's minimum, and
    /// returns the best `limit` in descending score order (ties keep merge order).
    async fn rank(
        &self,
        reference: &ReferenceJob,
        candidates: Vec<CandidateJob>,
        limit: usize,
    ) -> Vec<CandidateJob> {
        let breakdowns = self.scorer.score_all(reference, &candidates).await;

        let mut ranked: Vec<CandidateJob> = candidates
            .into_iter()
            .zip(breakdowns)
            .filter_map(|(mut job, breakdown)| {
                if !breakdown.policy.accepts(breakdown.score) {
                    debug!(
                        "Dropping '{}' at {} (score {:.2})",
                        job.title, job.company, breakdown.score
                    );
                    return None;
                }
                job.score = breakdown.score;
                job.match_reasons = breakdown.reasons;
                Some(job)
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }
}

async fn run_source(source: Arc<dyn JobSource>, query: SearchQuery) -> SourceRun {
    let kind = source.source();
    match source.scrape_within_budget(&query).await {
        Ok(result) => {
            info!("Source {kind} returned {} jobs", result.jobs.len());
            let status = SourceStatus::Ok {
                jobs: result.jobs.len(),
                has_more: result.has_more,
            };
            (result.jobs, SourceOutcome::new(kind, status))
        }
        Err(SourceError::Timeout(budget)) => {
            warn!("Source {kind} timed out after {budget:?}");
            (Vec::new(), SourceOutcome::new(kind, SourceStatus::TimedOut))
        }
        Err(e) => {
            warn!("Source {kind} failed: {e}");
            let status = SourceStatus::Failed {
                error: e.to_string(),
            };
            (Vec::new(), SourceOutcome::new(kind, status))
        }
    }
}
