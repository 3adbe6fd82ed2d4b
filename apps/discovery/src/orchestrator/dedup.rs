use std::collections::HashSet;

use crate::models::CandidateJob;
use crate::text::normalize::dedup_key;

/// Keeps the first posting for each (normalized title, normalized company).
pub fn dedupe(jobs: Vec<CandidateJob>) -> Vec<CandidateJob> {
    let mut seen = HashSet::new();
    jobs.into_iter()
        .filter(|job| seen.insert(dedup_key(&job.title, &job.company)))
        .collect()
}
