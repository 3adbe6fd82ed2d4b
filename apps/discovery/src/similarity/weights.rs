use serde::{Deserialize, Serialize};

/// Per-factor weights for the composite similarity score.
///
/// Weights need not sum to 1.0; the composite is clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub title: f64,
    pub company: f64,
    pub description: f64,
    pub location: f64,
    pub skills: f64,
}

impl ScoringWeights {
    /// Catalog records: structured fields are trustworthy, so every factor counts.
    pub const CATALOG: ScoringWeights = ScoringWeights {
        title: 0.40,
        company: 0.20,
        description: 0.20,
        location: 0.20,
        skills: 0.10,
    };

    /// Scraped cards: company and location act as bonuses on top of title and
    /// description, and there are no skills to compare.
    pub const WEB: ScoringWeights = ScoringWeights {
        title: 0.40,
        company: 0.20,
        description: 0.30,
        location: 0.10,
        skills: 0.0,
    };
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::CATALOG
    }
}

/// Sub-scores in `[0, 1]` that the weights are applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub title: f64,
    pub company: f64,
    pub description: f64,
    pub location: f64,
    pub skills: f64,
}

/// title*w + company*w + description*w + location*w + skills*w, clamped to [0, 1].
pub fn compute_combined_score(factors: &FactorScores, weights: &ScoringWeights) -> f64 {
    (weights.title * factors.title
        + weights.company * factors.company
        + weights.description * factors.description
        + weights.location * factors.location
        + weights.skills * factors.skills)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(value: f64) -> FactorScores {
        FactorScores {
            title: value,
            company: value,
            description: value,
            location: value,
            skills: value,
        }
    }

    #[test]
    fn test_combined_score_full_is_clamped() {
        // catalog weights sum to 1.1
        let score = compute_combined_score(&all(1.0), &ScoringWeights::CATALOG);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_combined_score_partial() {
        // 0.4*0.8 + 0.2*1.0 + 0.2*1.0 = 0.72
        let factors = FactorScores {
            title: 0.8,
            company: 1.0,
            location: 1.0,
            ..Default::default()
        };
        let score = compute_combined_score(&factors, &ScoringWeights::CATALOG);
        assert!((score - 0.72).abs() < 1e-9, "Score was {score}");
    }

    #[test]
    fn test_web_weights_ignore_skills() {
        let factors = FactorScores {
            skills: 1.0,
            ..Default::default()
        };
        assert_eq!(compute_combined_score(&factors, &ScoringWeights::WEB), 0.0);
    }

    #[test]
    fn test_zero_factors_zero_score() {
        assert_eq!(compute_combined_score(&all(0.0), &ScoringWeights::default()), 0.0);
    }
}
