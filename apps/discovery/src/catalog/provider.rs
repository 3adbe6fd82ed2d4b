use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::catalog::{CatalogQuery, CatalogStore};
use crate::models::{CandidateJob, ReferenceJob};
use crate::text::normalize::{city_filter, company_filter, title_tokens};
use crate::text::vocab::is_stop_word;

pub const DEFAULT_QUERY_LIMIT: usize = 20;
const TITLE_QUERY_TERMS: usize = 3;

/// Pulls catalog candidates for a reference job using up to three independent
/// heuristics: title keywords, company and city.
#[derive(Clone)]
pub struct DatabaseCandidateProvider {
    store: Arc<dyn CatalogStore>,
    query_limit: usize,
}

impl DatabaseCandidateProvider {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn with_query_limit(mut self, limit: usize) -> Self {
        self.query_limit = limit.max(1);
        self
    }

    pub async fn fetch_candidates(&self, reference: &ReferenceJob) -> Vec<CandidateJob> {
        let queries = catalog_queries(reference);
        if queries.is_empty() {
            return Vec::new();
        }

        let results = join_all(
            queries
                .iter()
                .map(|query| self.store.search_jobs(query, self.query_limit)),
        )
        .await;

        let mut seen = HashSet::new();
        if let Some(own_id) = reference.id {
            seen.insert(own_id);
        }

        let mut candidates = Vec::new();
        for (query, result) in queries.iter().zip(results) {
            match result {
                Ok(jobs) => {
                    for job in jobs {
                        if seen.insert(job.id) {
                            candidates.push(job.into_candidate());
                        }
                    }
                }
                Err(e) => warn!("Catalog query {query:?} failed: {e}"),
            }
        }

        info!("Catalog returned {} candidates", candidates.len());
        candidates
    }
}

/// The title, company and location queries, skipping any with nothing to search on.
pub fn catalog_queries(reference: &ReferenceJob) -> Vec<CatalogQuery> {
    let mut queries = Vec::with_capacity(3);

    let title_keywords: Vec<String> = title_tokens(&reference.title)
        .into_iter()
        .filter(|token| token.len() > 2 && !is_stop_word(token))
        .take(TITLE_QUERY_TERMS)
        .collect();
    if !title_keywords.is_empty() {
        queries.push(CatalogQuery::by_title(title_keywords));
    }

    let company = company_filter(&reference.company);
    if !company.is_empty() {
        queries.push(CatalogQuery::by_company(company));
    }

    if let Some(city) = reference
        .location
        .as_deref()
        .map(city_filter)
        .filter(|city| !city.is_empty())
    {
        queries.push(CatalogQuery::by_location(city));
    }

    queries
}
