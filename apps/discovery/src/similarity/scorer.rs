use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::OnceCell;

use crate::location::{LocationScorer, ParsedLocation, ResolvedLocation};
use crate::models::{CandidateJob, ReferenceJob, Source};
use crate::similarity::weights::{compute_combined_score, FactorScores, ScoringWeights};
use crate::text::normalize::{
    city_segment, detect_role, normalize_company, normalize_title, title_tokens,
};
use crate::text::{extract_technical_keywords, jaccard, text_similarity};

pub const SAME_ROLE_SCORE: f64 = 0.8;
pub const SAME_CITY_SCORE: f64 = 0.8;
/// Scraped candidates at or below this score are dropped.
pub const WEB_MIN_SCORE: f64 = 0.2;
/// Candidates scored at once; each may hit the geocoder.
pub const SCORING_CONCURRENCY: usize = 4;

const TITLE_REASON_THRESHOLD: f64 = 0.7;
const COMPANY_REASON_THRESHOLD: f64 = 0.8;
const LOCATION_REASON_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringPolicy {
    /// Full five-factor comparison with geocoded location.
    Catalog,
    /// Title and description weighted, company and both-remote as bonuses.
    Web,
}

impl ScoringPolicy {
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Catalog => ScoringPolicy::Catalog,
            _ => ScoringPolicy::Web,
        }
    }

    pub fn weights(self) -> ScoringWeights {
        match self {
            ScoringPolicy::Catalog => ScoringWeights::CATALOG,
            ScoringPolicy::Web => ScoringWeights::WEB,
        }
    }

    pub fn accepts(self, score: f64) -> bool {
        match self {
            ScoringPolicy::Catalog => true,
            ScoringPolicy::Web => score > WEB_MIN_SCORE,
        }
    }
}

/// Every sub-score for one (reference, candidate) pair plus the composite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    pub title: f64,
    pub company: f64,
    pub description: f64,
    pub location: f64,
    pub skills: f64,
    /// 1.0 when both sides carry the same job type. Not weighted.
    pub job_type: f64,
    /// 1.0 when both sides carry the same experience level. Not weighted.
    pub experience_level: f64,
    pub score: f64,
    pub policy: ScoringPolicy,
    pub reasons: Vec<String>,
}

impl SimilarityBreakdown {
    fn factors(&self) -> FactorScores {
        FactorScores {
            title: self.title,
            company: self.company,
            description: self.description,
            location: self.location,
            skills: self.skills,
        }
    }
}

#[derive(Clone)]
pub struct SimilarityScorer {
    location: LocationScorer,
}

impl SimilarityScorer {
    pub fn new(location: LocationScorer) -> Self {
        Self { location }
    }

    /// Scores `candidate` with the policy its source selects. Never fails:
    /// geocoding problems fall back to the location scorer's default.
    pub async fn score(
        &self,
        reference: &ReferenceJob,
        candidate: &CandidateJob,
    ) -> SimilarityBreakdown {
        self.score_with(reference, &OnceCell::new(), candidate).await
    }

    /// Scores a batch in input order. The reference location is geocoded at
    /// most once, and at most [`SCORING_CONCURRENCY`] candidates are in flight.
    pub async fn score_all(
        &self,
        reference: &ReferenceJob,
        candidates: &[CandidateJob],
    ) -> Vec<SimilarityBreakdown> {
        let anchor = OnceCell::new();
        stream::iter(candidates)
            .map(|candidate| self.score_with(reference, &anchor, candidate))
            .buffered(SCORING_CONCURRENCY)
            .collect()
            .await
    }

    async fn score_with(
        &self,
        reference: &ReferenceJob,
        anchor: &OnceCell<ResolvedLocation>,
        candidate: &CandidateJob,
    ) -> SimilarityBreakdown {
        let policy = ScoringPolicy::for_source(candidate.source);
        let reference_location = reference.location.as_deref().unwrap_or_default();

        let (description, location, skills) = match policy {
            ScoringPolicy::Catalog => (
                jaccard(
                    extract_technical_keywords(&reference.description),
                    extract_technical_keywords(&candidate.description),
                ),
                self.catalog_location(reference_location, anchor, &candidate.location)
                    .await,
                jaccard(
                    reference.skills.as_deref().unwrap_or_default(),
                    &candidate.skills,
                ),
            ),
            ScoringPolicy::Web => (
                text_similarity(&reference.description, &candidate.description),
                both_remote(reference_location, &candidate.location),
                0.0,
            ),
        };

        let mut breakdown = SimilarityBreakdown {
            title: title_score(&reference.title, &candidate.title),
            company: company_score(&reference.company, &candidate.company),
            description,
            location,
            skills,
            job_type: same(reference.job_type, candidate.job_type),
            experience_level: same(reference.experience_level, candidate.experience_level),
            score: 0.0,
            policy,
            reasons: Vec::new(),
        };
        breakdown.score = compute_combined_score(&breakdown.factors(), &policy.weights());
        breakdown.reasons = match_reasons(&breakdown);
        breakdown
    }

    async fn catalog_location(
        &self,
        reference: &str,
        anchor: &OnceCell<ResolvedLocation>,
        candidate: &str,
    ) -> f64 {
        let (a, b) = (reference.trim(), candidate.trim());
        if !a.is_empty() && a.eq_ignore_ascii_case(b) {
            return 1.0;
        }
        let city = city_segment(a);
        if !city.is_empty() && city == city_segment(b) {
            return SAME_CITY_SCORE;
        }
        let anchor = anchor.get_or_init(|| self.location.resolve(a)).await;
        self.location.score_from(anchor, b).await
    }
}

/// Exact normalized title → 1.0; same role noun → 0.8; else Jaccard over
/// seniority-stripped tokens.
pub fn title_score(reference: &str, candidate: &str) -> f64 {
    let (a, b) = (normalize_title(reference), normalize_title(candidate));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    match (detect_role(reference), detect_role(candidate)) {
        (Some(left), Some(right)) if left == right => SAME_ROLE_SCORE,
        _ => jaccard(title_tokens(reference), title_tokens(candidate)),
    }
}

pub fn company_score(reference: &str, candidate: &str) -> f64 {
    let a = normalize_company(reference);
    if !a.is_empty() && a == normalize_company(candidate) {
        1.0
    } else {
        0.0
    }
}

fn both_remote(reference: &str, candidate: &str) -> f64 {
    if ParsedLocation::parse(reference).is_remote && ParsedLocation::parse(candidate).is_remote {
        1.0
    } else {
        0.0
    }
}

fn same<T: PartialEq>(a: Option<T>, b: Option<T>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    }
}

fn match_reasons(breakdown: &SimilarityBreakdown) -> Vec<String> {
    [
        (breakdown.title > TITLE_REASON_THRESHOLD, "Similar job title"),
        (breakdown.company > COMPANY_REASON_THRESHOLD, "Same company"),
        (breakdown.location > LOCATION_REASON_THRESHOLD, "Similar location"),
        (breakdown.job_type == 1.0, "Same job type"),
        (breakdown.experience_level == 1.0, "Same experience level"),
    ]
    .into_iter()
    .filter(|(matched, _)| *matched)
    .map(|(_, reason)| reason.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::location::{Coordinates, GeocodeError, Geocoder, DEFAULT_SCORE};
    use crate::models::{ExperienceLevel, JobType};

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn lookup(&self, _address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            Ok(None)
        }
    }

    /// Knows every address, takes a while to answer, and records its load.
    #[derive(Default)]
    struct SlowGeocoder {
        lookups: Mutex<HashMap<String, usize>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for SlowGeocoder {
        async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            *self
                .lookups
                .lock()
                .unwrap()
                .entry(address.to_string())
                .or_default() += 1;
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(Coordinates { lat: 0.0, lon: 0.0 }))
        }
    }

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(LocationScorer::new(Arc::new(NoGeocoder)))
    }

    fn reference(title: &str, location: &str) -> ReferenceJob {
        ReferenceJob {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_role_same_company_both_remote() {
        let candidate = CandidateJob::new(Source::Catalog, "Senior Software Engineer", "Acme")
            .with_location("Remote");
        let breakdown = scorer()
            .score(&reference("Software Engineer", "Remote"), &candidate)
            .await;

        assert_eq!(breakdown.title, 0.8);
        assert_eq!(breakdown.company, 1.0);
        assert_eq!(breakdown.location, 1.0);
        assert_eq!(breakdown.description, 0.0);
        assert_eq!(breakdown.skills, 0.0);
        assert!(breakdown.score >= 0.7, "Score was {}", breakdown.score);
        assert!(breakdown.score <= 0.4 + 0.2 + 0.2 + 1e-9);
        assert_eq!(
            breakdown.reasons,
            vec!["Similar job title", "Same company", "Similar location"]
        );
    }

    #[tokio::test]
    async fn test_geocode_failure_is_fail_open() {
        let candidate = CandidateJob::new(Source::Catalog, "Data Analyst", "Globex")
            .with_location("Denver, CO");
        let breakdown = scorer()
            .score(&reference("Backend Engineer", "Austin, TX"), &candidate)
            .await;
        assert_eq!(breakdown.location, DEFAULT_SCORE);
        assert!(ScoringPolicy::Catalog.accepts(breakdown.score));
    }

    #[tokio::test]
    async fn test_same_city_catalog_location() {
        let candidate =
            CandidateJob::new(Source::Catalog, "Engineer", "Acme").with_location("Austin, Texas");
        let breakdown = scorer()
            .score(&reference("Engineer", "Austin, TX"), &candidate)
            .await;
        assert_eq!(breakdown.location, SAME_CITY_SCORE);
    }

    #[tokio::test]
    async fn test_catalog_description_and_skills() {
        let reference = ReferenceJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Python and Django on AWS".to_string(),
            skills: Some(vec!["Python".to_string(), "Django".to_string()]),
            job_type: Some(JobType::FullTime),
            experience_level: Some(ExperienceLevel::Mid),
            ..Default::default()
        };
        let mut candidate = CandidateJob::new(Source::Catalog, "Backend Engineer", "Initech")
            .with_description("We use python and docker on aws")
            .with_skills(vec!["python".to_string(), "docker".to_string()]);
        candidate.job_type = Some(JobType::FullTime);
        candidate.experience_level = Some(ExperienceLevel::Senior);

        let breakdown = scorer().score(&reference, &candidate).await;
        // {python, django, aws} vs {python, docker, aws}: 2 / 4
        assert!((breakdown.description - 0.5).abs() < 1e-9);
        // {python, django} vs {python, docker}: 1 / 3
        assert!((breakdown.skills - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(breakdown.job_type, 1.0);
        assert_eq!(breakdown.experience_level, 0.0);
        assert!(breakdown.reasons.contains(&"Same job type".to_string()));
    }

    #[tokio::test]
    async fn test_web_policy_bonuses() {
        let reference = ReferenceJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            description: "Build APIs in Python".to_string(),
            location: Some("Remote".to_string()),
            ..Default::default()
        };
        let candidate = CandidateJob::new(Source::Indeed, "Backend Engineer", "Acme Inc")
            .with_description("Build APIs in Python")
            .with_location("Remote (US)");

        let breakdown = scorer().score(&reference, &candidate).await;
        assert_eq!(breakdown.policy, ScoringPolicy::Web);
        // 0.4 + 0.2 + 0.3 + 0.1, clamped
        assert_eq!(breakdown.score, 1.0);
    }

    #[tokio::test]
    async fn test_web_policy_drops_weak_matches() {
        let candidate = CandidateJob::new(Source::LinkedIn, "Pastry Chef", "Bakery")
            .with_location("Paris");
        let breakdown = scorer()
            .score(&reference("Backend Engineer", "Austin, TX"), &candidate)
            .await;
        assert_eq!(breakdown.score, 0.0);
        assert!(!ScoringPolicy::Web.accepts(breakdown.score));
        assert!(!ScoringPolicy::Web.accepts(WEB_MIN_SCORE));
    }

    #[tokio::test]
    async fn test_scores_stay_in_bounds() {
        let candidates = [
            CandidateJob::new(Source::Catalog, "", ""),
            CandidateJob::new(Source::Glassdoor, "Software Engineer", "Acme")
                .with_location("Remote"),
            CandidateJob::new(Source::Catalog, "Software Engineer", "Acme")
                .with_location("Remote")
                .with_skills(vec!["rust".to_string()]),
        ];
        let reference = ReferenceJob {
            skills: Some(vec!["rust".to_string()]),
            description: "rust".to_string(),
            ..reference("Software Engineer", "Remote")
        };
        for candidate in &candidates {
            let breakdown = scorer().score(&reference, candidate).await;
            assert!((0.0..=1.0).contains(&breakdown.score), "{breakdown:?}");
        }
    }

    #[test]
    fn test_title_score() {
        assert_eq!(title_score("Data Engineer", "data engineer"), 1.0);
        assert_eq!(title_score("Sr. Data Engineer", "Platform Engineer"), SAME_ROLE_SCORE);
        // {product, analyst} vs {product, owner}: 1 / 3
        assert!((title_score("Product Analyst", "Product Owner") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(title_score("", "Engineer"), 0.0);
    }

    #[test]
    fn test_company_score_ignores_suffixes() {
        assert_eq!(company_score("Acme, Inc.", "ACME"), 1.0);
        assert_eq!(company_score("Acme", "Globex"), 0.0);
        assert_eq!(company_score("", ""), 0.0);
    }

    #[test]
    fn test_policy_for_source() {
        assert_eq!(ScoringPolicy::for_source(Source::Catalog), ScoringPolicy::Catalog);
        for source in Source::EXTERNAL {
            assert_eq!(ScoringPolicy::for_source(source), ScoringPolicy::Web);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_geocodes_reference_once_with_bounded_concurrency() {
        let geocoder = Arc::new(SlowGeocoder::default());
        let scorer = SimilarityScorer::new(LocationScorer::new(geocoder.clone()));
        let reference = reference("Backend Engineer", "Austin, TX");
        let candidates: Vec<CandidateJob> = (0..12)
            .map(|i| {
                CandidateJob::new(Source::Catalog, format!("Engineer {i}"), "Globex")
                    .with_location(format!("Town {i}, OK"))
            })
            .collect();

        let breakdowns = scorer.score_all(&reference, &candidates).await;

        assert_eq!(breakdowns.len(), candidates.len());
        let lookups = geocoder.lookups.lock().unwrap();
        assert_eq!(lookups.get("Austin, TX"), Some(&1));
        assert_eq!(lookups.len(), 13);
        assert!(geocoder.peak.load(Ordering::SeqCst) <= SCORING_CONCURRENCY);
        // Same coordinates everywhere: every candidate sits in the nearest bucket.
        assert!(breakdowns.iter().all(|b| b.location == 1.0));
    }
}
