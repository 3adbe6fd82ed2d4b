//! Single-posting extraction for a URL the user pasted.
//!
//! Three tiers, each only filling fields the previous tier left empty:
//! known job-board selectors, generic page structure (`h1`/`h2`, class-name
//! patterns), then guesses from the URL itself for a few ATS domains.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use scraper::Html;
use tracing::{info, warn};
use url::Url;

use crate::fetch::{FetchOptions, PageFetcher};
use crate::models::{PartialCandidateJob, Source};
use crate::sources::config::{resolve_field, FieldRule};
use crate::text::classify::{detect_experience_level, detect_job_type, parse_posted_date};

use FieldRule::{Attr, Text};

struct DetailSelectors {
    title: &'static [FieldRule],
    company: &'static [FieldRule],
    location: &'static [FieldRule],
    description: &'static [FieldRule],
    salary: &'static [FieldRule],
    posted_date: &'static [FieldRule],
}

const KNOWN_BOARDS: DetailSelectors = DetailSelectors {
    title: &[
        Text("h1.top-card-layout__title"),
        Text(".job-details-jobs-unified-top-card__job-title"),
        Text("h1.jobsearch-JobInfoHeader-title"),
        Text("[data-testid='jobsearch-JobInfoHeader-title']"),
        Text("h1[data-test='job-title']"),
        Text("div.listing-header-container h1"),
    ],
    company: &[
        Text(".job-details-jobs-unified-top-card__company-name"),
        Text("a.topcard__org-name-link"),
        Text("[data-testid='inlineHeader-companyName']"),
        Text("div[data-company-name='true']"),
        Text("[data-test='employer-name']"),
        Text("div.company-card h2"),
    ],
    location: &[
        Text("span.topcard__flavor--bullet"),
        Text("[data-testid='inlineHeader-companyLocation']"),
        Text("[data-testid='job-location']"),
        Text("[data-test='location']"),
    ],
    description: &[
        Text(".show-more-less-html__markup"),
        Text("#jobDescriptionText"),
        Text("[class*='JobDetails_jobDescription']"),
        Text("[data-test='job-description']"),
        Text("div.listing-container"),
    ],
    salary: &[
        Text("#salaryInfoAndJobType"),
        Text("[data-test='detailSalary']"),
        Text(".compensation__salary"),
    ],
    posted_date: &[
        Attr("time", "datetime"),
        Text("span.posted-time-ago__text"),
    ],
};

const GENERIC_PAGE: DetailSelectors = DetailSelectors {
    title: &[
        Text("h1"),
        Text("h2"),
        Text("[class*='job-title']"),
        Text("[class*='title']"),
    ],
    company: &[
        Text("[class*='company']"),
        Text("[class*='employer']"),
        Text("[class*='organization']"),
        Attr("meta[property='og:site_name']", "content"),
    ],
    location: &[Text("[class*='location']")],
    description: &[
        Text("[class*='description']"),
        Text("main"),
        Text("article"),
    ],
    salary: &[Text("[class*='salary']")],
    posted_date: &[],
};

const TIERS: [&DetailSelectors; 2] = [&KNOWN_BOARDS, &GENERIC_PAGE];

pub struct DetailScraper {
    fetcher: Arc<dyn PageFetcher>,
    options: FetchOptions,
}

impl DetailScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, options: FetchOptions) -> Self {
        Self { fetcher, options }
    }

    /// Returns `None` for unparseable URLs, or when neither a title nor a company
    /// could be recovered by any tier.
    pub async fn scrape_job_details(&self, url: &str) -> Option<PartialCandidateJob> {
        let parsed = match Url::parse(url.trim()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Not a valid job URL '{url}': {e}");
                return None;
            }
        };

        info!("Fetching job post: {parsed}");
        let html = match self.fetcher.fetch(&parsed, &self.options).await {
            Ok(page) => Some(page.html),
            Err(e) => {
                warn!("Could not fetch {parsed}, falling back to URL patterns: {e}");
                None
            }
        };

        let details = extract_details(html.as_deref(), &parsed, Utc::now().date_naive());
        match &details {
            Some(job) => info!(
                "Extracted job details: {} at {}",
                job.title.as_deref().unwrap_or("?"),
                job.company.as_deref().unwrap_or("?")
            ),
            None => warn!("No title or company found for {parsed}"),
        }
        details
    }
}

pub fn extract_details(
    html: Option<&str>,
    url: &Url,
    today: NaiveDate,
) -> Option<PartialCandidateJob> {
    let mut job = PartialCandidateJob {
        url: url.to_string(),
        source: source_for_host(url),
        ..Default::default()
    };

    if let Some(html) = html {
        let document = Html::parse_document(html);
        let root = document.root_element();

        for tier in TIERS {
            fill(&mut job.title, tier.title, root);
            fill(&mut job.company, tier.company, root);
            fill(&mut job.location, tier.location, root);
            fill(&mut job.description, tier.description, root);
            fill(&mut job.salary, tier.salary, root);
            if job.posted_date.is_none() {
                job.posted_date = resolve_field(tier.posted_date, root)
                    .and_then(|raw| parse_posted_date(&raw, today));
            }
        }
    }

    let guess = guess_from_url(url);
    if job.title.is_none() {
        job.title = guess.title;
    }
    if job.company.is_none() {
        job.company = guess.company;
    }

    if job.title.is_none() && job.company.is_none() {
        return None;
    }

    let title = job.title.clone().unwrap_or_default();
    let description = job.description.clone().unwrap_or_default();
    job.job_type = detect_job_type(&title, &description);
    job.experience_level = detect_experience_level(&title, &description);

    Some(job)
}

fn fill(slot: &mut Option<String>, rules: &[FieldRule], root: scraper::ElementRef<'_>) {
    if slot.is_none() {
        *slot = resolve_field(rules, root);
    }
}

fn source_for_host(url: &Url) -> Option<Source> {
    let host = url.host_str()?.to_lowercase();
    [
        ("indeed.com", Source::Indeed),
        ("linkedin.com", Source::LinkedIn),
        ("glassdoor.com", Source::Glassdoor),
        ("weworkremotely.com", Source::WeWorkRemotely),
    ]
    .into_iter()
    .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
    .map(|(_, source)| source)
}

#[derive(Debug, Default, PartialEq)]
struct UrlGuess {
    title: Option<String>,
    company: Option<String>,
}

/// Recovers title/company from well-known URL shapes:
/// `linkedin.com/jobs/view/<title>-at-<company>-<id>`, Greenhouse and Lever boards
/// (`/<company>/...`), and Workday tenants (`<company>.wd5.myworkdayjobs.com`).
fn guess_from_url(url: &Url) -> UrlGuess {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if host.ends_with("linkedin.com") {
        if let ["jobs", "view", slug, ..] = segments.as_slice() {
            return guess_linkedin_slug(slug);
        }
        return UrlGuess::default();
    }

    if host.ends_with("greenhouse.io") || host == "jobs.lever.co" || host == "apply.workable.com"
    {
        return UrlGuess {
            title: None,
            company: segments.first().map(|company| humanize_slug(company)),
        };
    }

    if host.ends_with(".myworkdayjobs.com") {
        return UrlGuess {
            title: None,
            company: host.split('.').next().map(humanize_slug),
        };
    }

    UrlGuess::default()
}

fn guess_linkedin_slug(slug: &str) -> UrlGuess {
    // trailing numeric id, e.g. "...-at-acme-corp-3812345678"
    let without_id = match slug.rsplit_once('-') {
        Some((rest, id)) if id.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => slug,
    };

    match without_id.rsplit_once("-at-") {
        Some((title, company)) => UrlGuess {
            title: Some(humanize_slug(title)).filter(|t| !t.is_empty()),
            company: Some(humanize_slug(company)).filter(|c| !c.is_empty()),
        },
        None if !without_id.chars().all(|c| c.is_ascii_digit()) => UrlGuess {
            title: Some(humanize_slug(without_id)),
            company: None,
        },
        None => UrlGuess::default(),
    }
}

/// "acme-corp" → "Acme Corp"
fn humanize_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
