//! Declarative description of one job site, consumed by the generic extractor.

use std::time::Duration;

use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

use crate::models::Source;
use crate::sources::SearchQuery;

pub const LIGHTWEIGHT_TIMEOUT: Duration = Duration::from_secs(15);
pub const BROWSER_TIMEOUT: Duration = Duration::from_secs(30);

/// How the site serves its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Server-rendered HTML or an HTML-fragment API. Cheap to fetch.
    Static,
    /// Results are rendered client-side; the fetcher must wait for the DOM to settle.
    Browser,
}

impl RenderMode {
    pub fn default_timeout(self) -> Duration {
        match self {
            RenderMode::Static => LIGHTWEIGHT_TIMEOUT,
            RenderMode::Browser => BROWSER_TIMEOUT,
        }
    }
}

/// One way of reading a field out of a job card. Rules are tried in order and the
/// first non-empty value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Text of the first element under the card matching the selector.
    Text(&'static str),
    /// Attribute of the first element under the card matching the selector.
    Attr(&'static str, &'static str),
    /// Attribute on the card element itself.
    CardAttr(&'static str),
}

impl FieldRule {
    pub fn apply(&self, card: ElementRef<'_>) -> Option<String> {
        let value = match *self {
            FieldRule::Text(selector) => {
                let element = card.select(&parse_selector(selector)?).next()?;
                clean_text(&element.text().collect::<Vec<_>>().join(" "))
            }
            FieldRule::Attr(selector, attr) => {
                let element = card.select(&parse_selector(selector)?).next()?;
                element.value().attr(attr)?.trim().to_string()
            }
            FieldRule::CardAttr(attr) => card.value().attr(attr)?.trim().to_string(),
        };

        (!value.is_empty()).then_some(value)
    }
}

/// Tries each rule in order until one yields a non-empty value.
pub fn resolve_field(rules: &[FieldRule], card: ElementRef<'_>) -> Option<String> {
    rules.iter().find_map(|rule| rule.apply(card))
}

pub(crate) fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            debug!("Skipping invalid selector: {selector}");
            None
        }
    }
}

/// Collapses all runs of whitespace (including newlines) to single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy)]
pub struct CardSelectors {
    /// Alternatives for the card container; the first one that matches anything is used.
    pub job_card: &'static [&'static str],
    pub title: &'static [FieldRule],
    pub company: &'static [FieldRule],
    pub location: &'static [FieldRule],
    pub description: &'static [FieldRule],
    pub url: &'static [FieldRule],
    pub salary: &'static [FieldRule],
    pub posted_date: &'static [FieldRule],
}

/// Site-specific query parameter names.
#[derive(Debug, Clone, Copy)]
pub struct QueryParams {
    pub keywords: &'static str,
    pub location: Option<&'static str>,
    /// (name, value) appended when the search is for remote roles.
    pub remote: Option<(&'static str, &'static str)>,
    pub extra: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub param: &'static str,
    /// Parameter value of the first page (only sent for later pages).
    pub first: u32,
    pub step: u32,
    pub max_pages: u32,
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub source: Source,
    pub base_url: &'static str,
    pub search_path: &'static str,
    pub params: QueryParams,
    pub selectors: CardSelectors,
    pub pagination: Option<Pagination>,
    pub render: RenderMode,
    pub timeout: Duration,
    /// How many leading search keywords go into the site's keyword box.
    pub max_query_terms: usize,
}

impl SourceConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_pages(&self) -> u32 {
        self.pagination.map(|p| p.max_pages.max(1)).unwrap_or(1)
    }

    /// Search URL for the zero-based `page`.
    pub fn search_url(&self, query: &SearchQuery, page: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(self.base_url)?.join(self.search_path)?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(self.params.keywords, &query.text(self.max_query_terms));

            if let (Some(param), Some(location)) = (self.params.location, &query.location) {
                pairs.append_pair(param, location);
            }
            if query.remote {
                if let Some((name, value)) = self.params.remote {
                    pairs.append_pair(name, value);
                }
            }
            for (name, value) in self.params.extra {
                pairs.append_pair(name, value);
            }
            if let Some(pagination) = self.pagination.filter(|_| page > 0) {
                let value = pagination.first + page * pagination.step;
                pairs.append_pair(pagination.param, &value.to_string());
            }
        }

        Ok(url)
    }
}
