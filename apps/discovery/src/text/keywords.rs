//! Keyword extraction over free text and reference jobs.
//!
//! Every function returns keywords in first-seen order without duplicates, so
//! search queries built from them are reproducible.

use crate::models::ReferenceJob;
use crate::text::normalize::normalize_company;
use crate::text::vocab::{is_stop_word, TECHNICAL_TERMS};

/// Cap on keywords handed to external search queries.
pub const MAX_SEARCH_KEYWORDS: usize = 10;

/// Lower-cases, splits on whitespace, strips non-letters, and drops short tokens
/// and stop words.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for raw in text.to_lowercase().split_whitespace() {
        let token: String = raw.chars().filter(|c| c.is_alphabetic()).collect();
        if token.chars().count() <= 2 || is_stop_word(&token) {
            continue;
        }
        if !keywords.contains(&token) {
            keywords.push(token);
        }
    }

    keywords
}

/// Returns the technical vocabulary terms that occur anywhere in `text`.
pub fn extract_technical_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TECHNICAL_TERMS
        .iter()
        .filter(|term| lower.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

/// Builds the keyword list used for external searches:
/// title words, description words, description tech terms, then the company.
pub fn extract_search_keywords(job: &ReferenceJob) -> Vec<String> {
    let company = normalize_company(&job.company);

    let candidates = extract_keywords(&job.title)
        .into_iter()
        .chain(extract_keywords(&job.description))
        .chain(extract_technical_keywords(&job.description))
        .chain((!company.is_empty()).then_some(company));

    let mut keywords: Vec<String> = Vec::new();
    for keyword in candidates {
        if is_stop_word(&keyword) || keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
        if keywords.len() == MAX_SEARCH_KEYWORDS {
            break;
        }
    }

    keywords
}
