//! Deterministic multi-factor similarity between a reference job and a candidate.

pub mod scorer;
pub mod weights;

pub use scorer::{ScoringPolicy, SimilarityBreakdown, SimilarityScorer};
pub use weights::ScoringWeights;
