//! Built-in site definitions.
//!
//! Selectors list the current markup first and older layouts after it; the
//! extractor stops at the first alternative that yields a value.

use crate::models::Source;
use crate::sources::config::{
    CardSelectors, FieldRule, Pagination, QueryParams, RenderMode, SourceConfig,
};

use FieldRule::{Attr, CardAttr, Text};

const DEFAULT_QUERY_TERMS: usize = 4;

const INDEED_SELECTORS: CardSelectors = CardSelectors {
    job_card: &[
        "div.job_seen_beacon",
        "td.resultContent",
        "div.jobsearch-SerpJobCard",
    ],
    title: &[
        Text("h2.jobTitle span[title]"),
        Text("h2.jobTitle"),
        Text("a.jcs-JobTitle"),
    ],
    company: &[
        Text("[data-testid='company-name']"),
        Text("span.companyName"),
        Text(".company"),
    ],
    location: &[
        Text("[data-testid='text-location']"),
        Text("div.companyLocation"),
        Text(".location"),
    ],
    description: &[Text("div.job-snippet"), Text(".summary")],
    url: &[
        Attr("h2.jobTitle a", "href"),
        Attr("a.jcs-JobTitle", "href"),
        Attr("a[data-jk]", "href"),
    ],
    salary: &[
        Text("div.salary-snippet-container"),
        Text("[data-testid='attribute_snippet_testid']"),
        Text(".salaryText"),
    ],
    posted_date: &[
        Text("[data-testid='myJobsStateDate']"),
        Text("span.date"),
    ],
};

const LINKEDIN_SELECTORS: CardSelectors = CardSelectors {
    job_card: &["div.base-card", "div.base-search-card", "div.job-search-card"],
    title: &[
        Text("h3.base-search-card__title"),
        Text(".job-search-card__title"),
    ],
    company: &[
        Text("h4.base-search-card__subtitle a"),
        Text("h4.base-search-card__subtitle"),
    ],
    location: &[Text("span.job-search-card__location")],
    description: &[],
    url: &[
        Attr("a.base-card__full-link", "href"),
        CardAttr("href"),
        Attr("a", "href"),
    ],
    salary: &[Text("span.job-search-card__salary-info")],
    posted_date: &[
        Attr("time", "datetime"),
        Text("time.job-search-card__listdate"),
    ],
};

const GLASSDOOR_SELECTORS: CardSelectors = CardSelectors {
    job_card: &[
        "li[data-test='jobListing']",
        "li.react-job-listing",
        "div[class*='JobCard_jobCardContainer']",
    ],
    title: &[
        Text("a[data-test='job-title']"),
        Text("[class*='JobCard_jobTitle']"),
        Text("a.jobLink span"),
    ],
    company: &[
        Text("[class*='EmployerProfile_compactEmployerName']"),
        Text("[data-test='employer-short-name']"),
        Text("div.job-search-8wag7x"),
    ],
    location: &[
        Text("[data-test='emp-location']"),
        Text("[class*='JobCard_location']"),
    ],
    description: &[
        Text("[data-test='descSnippet']"),
        Text("[class*='JobCard_jobDescriptionSnippet']"),
    ],
    url: &[
        Attr("a[data-test='job-title']", "href"),
        Attr("a.jobLink", "href"),
    ],
    salary: &[
        Text("[data-test='detailSalary']"),
        Text("[class*='JobCard_salaryEstimate']"),
    ],
    posted_date: &[
        Text("[data-test='job-age']"),
        Text("[class*='JobCard_listingAge']"),
    ],
};

const WWR_SELECTORS: CardSelectors = CardSelectors {
    job_card: &[
        "li.new-listing-container",
        "section.jobs li.feature",
        "section.jobs li",
    ],
    title: &[Text("h4.new-listing__header__title"), Text("span.title")],
    company: &[Text("p.new-listing__company-name"), Text("span.company")],
    location: &[
        Text("p.new-listing__company-headquarters"),
        Text("span.region"),
    ],
    description: &[Text("div.new-listing__categories")],
    url: &[
        Attr("a[href^='/remote-jobs/']", "href"),
        Attr("a", "href"),
    ],
    salary: &[Text("p.new-listing__categories__category--salary")],
    posted_date: &[Attr("time", "datetime"), Text("span.date")],
};

pub fn indeed() -> SourceConfig {
    SourceConfig {
        source: Source::Indeed,
        base_url: "https://www.indeed.com",
        search_path: "/jobs",
        params: QueryParams {
            keywords: "q",
            location: Some("l"),
            remote: Some(("sc", "0kf:attr(DSQF7);")),
            extra: &[],
        },
        selectors: INDEED_SELECTORS,
        pagination: Some(Pagination {
            param: "start",
            first: 0,
            step: 10,
            max_pages: 2,
        }),
        render: RenderMode::Browser,
        timeout: RenderMode::Browser.default_timeout(),
        max_query_terms: DEFAULT_QUERY_TERMS,
    }
}

/// LinkedIn's guest search endpoint returns plain HTML fragments.
pub fn linkedin() -> SourceConfig {
    SourceConfig {
        source: Source::LinkedIn,
        base_url: "https://www.linkedin.com",
        search_path: "/jobs-guest/jobs/api/seeMoreJobPostings/search",
        params: QueryParams {
            keywords: "keywords",
            location: Some("location"),
            remote: Some(("f_WT", "2")),
            extra: &[],
        },
        selectors: LINKEDIN_SELECTORS,
        pagination: Some(Pagination {
            param: "start",
            first: 0,
            step: 25,
            max_pages: 2,
        }),
        render: RenderMode::Static,
        timeout: RenderMode::Static.default_timeout(),
        max_query_terms: DEFAULT_QUERY_TERMS,
    }
}

pub fn glassdoor() -> SourceConfig {
    SourceConfig {
        source: Source::Glassdoor,
        base_url: "https://www.glassdoor.com",
        search_path: "/Job/jobs.htm",
        params: QueryParams {
            keywords: "sc.keyword",
            location: Some("locKeyword"),
            remote: Some(("remoteWorkType", "1")),
            extra: &[],
        },
        selectors: GLASSDOOR_SELECTORS,
        pagination: Some(Pagination {
            param: "p",
            first: 1,
            step: 1,
            max_pages: 1,
        }),
        render: RenderMode::Browser,
        timeout: RenderMode::Browser.default_timeout(),
        max_query_terms: 3,
    }
}

/// Remote-only board; location parameters do not apply.
pub fn we_work_remotely() -> SourceConfig {
    SourceConfig {
        source: Source::WeWorkRemotely,
        base_url: "https://weworkremotely.com",
        search_path: "/remote-jobs/search",
        params: QueryParams {
            keywords: "term",
            location: None,
            remote: None,
            extra: &[],
        },
        selectors: WWR_SELECTORS,
        pagination: None,
        render: RenderMode::Static,
        timeout: RenderMode::Static.default_timeout(),
        max_query_terms: 2,
    }
}

pub fn config_for(source: Source) -> Option<SourceConfig> {
    match source {
        Source::Indeed => Some(indeed()),
        Source::LinkedIn => Some(linkedin()),
        Source::Glassdoor => Some(glassdoor()),
        Source::WeWorkRemotely => Some(we_work_remotely()),
        Source::Catalog => None,
    }
}

pub fn builtin_sources() -> Vec<SourceConfig> {
    Source::EXTERNAL.into_iter().filter_map(config_for).collect()
}
