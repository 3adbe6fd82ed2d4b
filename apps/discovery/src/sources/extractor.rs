use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::ExtractionError;
use crate::fetch::{
    FetchOptions, FetchedPage, PageFetcher, DEFAULT_PAGE_LOAD_TIMEOUT, DEFAULT_SETTLE_DELAY,
};
use crate::models::{CandidateJob, RawExtractedJob, Source};
use crate::sources::config::{
    parse_selector, resolve_field, CardSelectors, RenderMode, SourceConfig,
};
use crate::sources::{JobSource, ScrapeResult, SearchQuery, SourceError};
use crate::text::classify::{detect_experience_level, detect_job_type, parse_posted_date};

/// Generic driver that runs any [`SourceConfig`] against a [`PageFetcher`].
pub struct SourceExtractor {
    config: SourceConfig,
    fetcher: Arc<dyn PageFetcher>,
    page_load_timeout: Duration,
    settle_delay: Duration,
}

impl SourceExtractor {
    pub fn new(config: SourceConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            fetcher,
            page_load_timeout: DEFAULT_PAGE_LOAD_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    pub fn with_page_timing(mut self, page_load_timeout: Duration, settle_delay: Duration) -> Self {
        self.page_load_timeout = page_load_timeout;
        self.settle_delay = settle_delay;
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    fn fetch_options(&self) -> FetchOptions {
        match self.config.render {
            RenderMode::Static => FetchOptions {
                timeout: self.page_load_timeout,
                settle_delay: Duration::ZERO,
            },
            RenderMode::Browser => {
                FetchOptions::rendered(self.page_load_timeout, self.settle_delay)
            }
        }
    }
}

#[async_trait]
impl JobSource for SourceExtractor {
    fn source(&self) -> Source {
        self.config.source
    }

    fn timeout(&self) -> Duration {
        self.config.timeout
    }

    async fn try_scrape(&self, query: &SearchQuery) -> Result<ScrapeResult, SourceError> {
        let source = self.config.source;
        let options = self.fetch_options();
        let today = Utc::now().date_naive();

        let mut jobs = Vec::new();
        let mut has_more = false;

        for page in 0..self.config.max_pages() {
            let url = self.config.search_url(query, page)?;
            debug!("Scraping {source} page {page}: {url}");

            let fetched = match self.fetcher.fetch(&url, &options).await {
                Ok(fetched) => fetched,
                Err(e) if page > 0 => {
                    warn!("{source} page {page} failed, keeping earlier pages: {e}");
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            let page_jobs = extract_page(source, &self.config.selectors, &fetched, today);
            if page_jobs.is_empty() {
                if page == 0 {
                    warn!("No job cards found on {url}");
                }
                has_more = false;
                break;
            }

            jobs.extend(page_jobs);
            has_more = self.config.pagination.is_some();
        }

        info!("{source} returned {} jobs", jobs.len());
        Ok(ScrapeResult {
            jobs,
            has_more,
            error: None,
        })
    }
}

/// Parses one results page into candidates. Cards without a title or company are skipped.
pub fn extract_page(
    source: Source,
    selectors: &CardSelectors,
    page: &FetchedPage,
    today: NaiveDate,
) -> Vec<CandidateJob> {
    extract_cards(selectors, &page.html)
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match build_candidate(raw, source, &page.url, today) {
            Ok(job) => Some(job),
            Err(e) => {
                debug!("Skipping {source} card {index}: {e}");
                None
            }
        })
        .collect()
}

/// Reads every job card on the page into a typed record.
pub fn extract_cards(selectors: &CardSelectors, html: &str) -> Vec<RawExtractedJob> {
    let document = Html::parse_document(html);

    for card_selector in selectors.job_card {
        let Some(selector) = parse_selector(card_selector) else {
            continue;
        };

        let cards: Vec<RawExtractedJob> = document
            .select(&selector)
            .map(|card| RawExtractedJob {
                title: resolve_field(selectors.title, card),
                company: resolve_field(selectors.company, card),
                location: resolve_field(selectors.location, card),
                description: resolve_field(selectors.description, card),
                url: resolve_field(selectors.url, card),
                salary: resolve_field(selectors.salary, card),
                posted_date: resolve_field(selectors.posted_date, card),
            })
            .collect();

        if !cards.is_empty() {
            return cards;
        }
    }

    Vec::new()
}

pub fn build_candidate(
    raw: RawExtractedJob,
    source: Source,
    page_url: &Url,
    today: NaiveDate,
) -> Result<CandidateJob, ExtractionError> {
    if raw.title.is_none() && raw.company.is_none() {
        return Err(ExtractionError::MissingIdentity);
    }

    let title = raw.title.unwrap_or_default();
    let company = raw.company.unwrap_or_default();
    let description = raw.description.unwrap_or_default();

    let url = raw
        .url
        .as_deref()
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone());

    let mut job = CandidateJob::new(source, title, company)
        .with_description(description)
        .with_location(raw.location.unwrap_or_default())
        .with_url(url.to_string());
    job.salary = raw.salary;
    job.job_type = detect_job_type(&job.title, &job.description);
    job.experience_level = detect_experience_level(&job.title, &job.description);
    job.posted_date = raw
        .posted_date
        .as_deref()
        .and_then(|posted| parse_posted_date(posted, today));

    Ok(job)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::fetch::FetchError;
    use crate::models::{ExperienceLevel, JobType};
    use crate::sources::registry;

    const INDEED_PAGE: &str = r#"
        <html><body>
        <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="/rc/clk?jk=111"><span title="Senior Backend Engineer">Senior Backend Engineer</span></a></h2>
            <span data-testid="company-name">Acme Inc</span>
            <div data-testid="text-location">Austin, TX</div>
            <div class="job-snippet">Full-time role building Python services on AWS.</div>
            <div class="salary-snippet-container">$150,000 - $180,000 a year</div>
            <span data-testid="myJobsStateDate">Posted 3 days ago</span>
        </div>
        <div class="job_seen_beacon">
            <div class="job-snippet">An ad slot with no title or company</div>
        </div>
        <div class="job_seen_beacon">
            <h2 class="jobTitle"><a href="https://www.indeed.com/viewjob?jk=222">Data Analyst</a></h2>
            <div class="companyLocation">Remote</div>
        </div>
        </body></html>
    "#;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn page(html: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse("https://www.indeed.com/jobs?q=backend").unwrap(),
            html: html.to_string(),
        }
    }

    /// Serves canned HTML by URL and records what was requested.
    struct CannedFetcher {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<(String, FetchOptions)>>,
    }

    impl CannedFetcher {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(
            &self,
            url: &Url,
            options: &FetchOptions,
        ) -> Result<FetchedPage, FetchError> {
            self.requested
                .lock()
                .unwrap()
                .push((url.to_string(), options.clone()));
            match self.pages.get(url.as_str()) {
                Some(html) => Ok(FetchedPage {
                    url: url.clone(),
                    html: html.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn query() -> SearchQuery {
        SearchQuery {
            keywords: vec!["backend".to_string(), "engineer".to_string()],
            location: None,
            remote: false,
        }
    }

    #[test]
    fn test_extract_page_resolves_fields() {
        let jobs = extract_page(
            Source::Indeed,
            &registry::indeed().selectors,
            &page(INDEED_PAGE),
            today(),
        );
        assert_eq!(jobs.len(), 2, "ad card without identity must be skipped");

        let first = &jobs[0];
        assert_eq!(first.title, "Senior Backend Engineer");
        assert_eq!(first.company, "Acme Inc");
        assert_eq!(first.location, "Austin, TX");
        assert_eq!(first.url, "https://www.indeed.com/rc/clk?jk=111");
        assert_eq!(first.salary.as_deref(), Some("$150,000 - $180,000 a year"));
        assert_eq!(first.job_type, Some(JobType::FullTime));
        assert_eq!(first.experience_level, Some(ExperienceLevel::Senior));
        assert_eq!(first.posted_date, NaiveDate::from_ymd_opt(2024, 6, 12));
        assert_eq!(first.source, Source::Indeed);
    }

    #[test]
    fn test_card_with_title_only_is_kept() {
        let jobs = extract_page(
            Source::Indeed,
            &registry::indeed().selectors,
            &page(INDEED_PAGE),
            today(),
        );
        let analyst = &jobs[1];
        assert_eq!(analyst.title, "Data Analyst");
        assert_eq!(analyst.company, "");
        assert_eq!(analyst.location, "Remote");
        assert_eq!(analyst.url, "https://www.indeed.com/viewjob?jk=222");
    }

    #[test]
    fn test_no_cards_yields_empty() {
        let jobs = extract_page(
            Source::Indeed,
            &registry::indeed().selectors,
            &page("<html><body><p>captcha</p></body></html>"),
            today(),
        );
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_build_candidate_requires_title_or_company() {
        let url = Url::parse("https://example.com/search").unwrap();
        let err = build_candidate(RawExtractedJob::default(), Source::LinkedIn, &url, today());
        assert!(matches!(err, Err(ExtractionError::MissingIdentity)));
    }

    #[test]
    fn test_build_candidate_defaults_url_to_page() {
        let url = Url::parse("https://example.com/search").unwrap();
        let raw = RawExtractedJob {
            company: Some("Acme".to_string()),
            ..Default::default()
        };
        let job = build_candidate(raw, Source::LinkedIn, &url, today()).unwrap();
        assert_eq!(job.url, "https://example.com/search");
    }

    #[tokio::test]
    async fn test_try_scrape_paginates_until_empty_page() {
        let config = registry::indeed();
        let first = config.search_url(&query(), 0).unwrap().to_string();
        let fetcher = Arc::new(CannedFetcher::new(&[(first.as_str(), INDEED_PAGE)]));
        let extractor = SourceExtractor::new(config, fetcher.clone());

        let result = extractor.try_scrape(&query()).await.unwrap();
        assert_eq!(result.jobs.len(), 2);
        // second page 404s: earlier results are kept
        assert_eq!(fetcher.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_has_more_when_page_limit_reached() {
        let config = registry::indeed();
        let first = config.search_url(&query(), 0).unwrap().to_string();
        let second = config.search_url(&query(), 1).unwrap().to_string();
        let fetcher = Arc::new(CannedFetcher::new(&[
            (first.as_str(), INDEED_PAGE),
            (second.as_str(), INDEED_PAGE),
        ]));
        let extractor = SourceExtractor::new(config, fetcher);

        let result = extractor.try_scrape(&query()).await.unwrap();
        assert_eq!(result.jobs.len(), 4);
        assert!(result.has_more);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_an_error() {
        let fetcher = Arc::new(CannedFetcher::new(&[]));
        let extractor = SourceExtractor::new(registry::linkedin(), fetcher);

        let err = extractor.try_scrape(&query()).await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch(FetchError::Status { status: 404, .. })));

        let settled = extractor.scrape(&query()).await;
        assert!(settled.jobs.is_empty());
        assert!(settled.error.is_some());
    }

    #[tokio::test]
    async fn test_browser_sources_request_settle_delay() {
        let fetcher = Arc::new(CannedFetcher::new(&[]));
        let browser = SourceExtractor::new(registry::glassdoor(), fetcher.clone())
            .with_page_timing(Duration::from_secs(20), Duration::from_secs(2));
        let _ = browser.try_scrape(&query()).await;
        let stat = SourceExtractor::new(registry::linkedin(), fetcher.clone());
        let _ = stat.try_scrape(&query()).await;

        let requested = fetcher.requested.lock().unwrap();
        assert_eq!(requested[0].1.settle_delay, Duration::from_secs(2));
        assert_eq!(requested[0].1.timeout, Duration::from_secs(20));
        assert_eq!(requested[1].1.settle_delay, Duration::ZERO);
    }
}
