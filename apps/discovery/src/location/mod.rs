//! Location proximity scoring.
//!
//! Remote markers are resolved first; otherwise both sides are geocoded and the
//! great-circle distance is bucketed. Any geocoding failure is fail-open and
//! yields [`DEFAULT_SCORE`] instead of zeroing the candidate.

pub mod cache;
pub mod geocoder;

use std::sync::Arc;

use tracing::debug;

use crate::text::vocab::REMOTE_MARKERS;

pub use cache::CachedGeocoder;
pub use geocoder::{distance_km, Coordinates, GeocodeError, Geocoder, NominatimGeocoder};

/// Score used when either location cannot be resolved.
pub const DEFAULT_SCORE: f64 = 0.3;
pub const ONE_REMOTE_SCORE: f64 = 0.5;

/// (max distance km, score), checked in order.
const DISTANCE_BUCKETS: &[(f64, f64)] = &[(10.0, 1.0), (25.0, 0.8), (50.0, 0.6), (100.0, 0.4)];
const FAR_SCORE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLocation {
    pub is_remote: bool,
    pub raw: String,
}

impl ParsedLocation {
    pub fn parse(location: &str) -> Self {
        let lower = location.to_lowercase();
        Self {
            is_remote: REMOTE_MARKERS.iter().any(|marker| lower.contains(marker)),
            raw: location.trim().to_string(),
        }
    }
}

pub fn distance_score(km: f64) -> f64 {
    DISTANCE_BUCKETS
        .iter()
        .find(|(max_km, _)| km <= *max_km)
        .map(|(_, score)| *score)
        .unwrap_or(FAR_SCORE)
}

/// A location parsed once and, when it names a place, geocoded once.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub parsed: ParsedLocation,
    pub coordinates: Option<Coordinates>,
}

/// Scores two locations. Holds no cache of its own; wrap the geocoder in
/// [`CachedGeocoder`] for that.
#[derive(Clone)]
pub struct LocationScorer {
    geocoder: Arc<dyn Geocoder>,
}

impl LocationScorer {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves the side that stays fixed across many comparisons.
    pub async fn resolve(&self, location: &str) -> ResolvedLocation {
        let parsed = ParsedLocation::parse(location);
        let coordinates = if parsed.is_remote || parsed.raw.is_empty() {
            None
        } else {
            self.geocoder.geocode(&parsed.raw).await
        };
        ResolvedLocation {
            parsed,
            coordinates,
        }
    }

    pub async fn score(&self, a: &str, b: &str) -> f64 {
        let anchor = self.resolve(a).await;
        self.score_from(&anchor, b).await
    }

    /// Scores `other` against an already resolved location, geocoding only `other`.
    pub async fn score_from(&self, anchor: &ResolvedLocation, other: &str) -> f64 {
        let left = &anchor.parsed;
        let right = ParsedLocation::parse(other);

        match (left.is_remote, right.is_remote) {
            (true, true) => return 1.0,
            (true, false) | (false, true) => return ONE_REMOTE_SCORE,
            (false, false) => {}
        }

        if left.raw.is_empty() || right.raw.is_empty() {
            return DEFAULT_SCORE;
        }
        let Some(from) = anchor.coordinates else {
            return DEFAULT_SCORE;
        };

        match self.geocoder.geocode(&right.raw).await {
            Some(to) => {
                let km = distance_km(from, to);
                debug!("Distance '{}' → '{}' is {km:.1} km", left.raw, right.raw);
                distance_score(km)
            }
            None => DEFAULT_SCORE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    struct FixedGeocoder {
        places: HashMap<&'static str, Coordinates>,
        calls: AtomicUsize,
    }

    impl FixedGeocoder {
        fn new(places: &[(&'static str, f64, f64)]) -> Self {
            Self {
                places: places
                    .iter()
                    .map(|(name, lat, lon)| {
                        (
                            *name,
                            Coordinates {
                                lat: *lat,
                                lon: *lon,
                            },
                        )
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.places.get(address).copied())
        }
    }

    fn scorer_with(places: &[(&'static str, f64, f64)]) -> (LocationScorer, Arc<FixedGeocoder>) {
        let geocoder = Arc::new(FixedGeocoder::new(places));
        (LocationScorer::new(geocoder.clone()), geocoder)
    }

    #[test]
    fn test_parse_remote_markers() {
        assert!(ParsedLocation::parse("Remote (US)").is_remote);
        assert!(ParsedLocation::parse("Work from home").is_remote);
        assert!(!ParsedLocation::parse("Austin, TX").is_remote);
    }

    #[test]
    fn test_distance_buckets() {
        assert_eq!(distance_score(0.0), 1.0);
        assert_eq!(distance_score(10.0), 1.0);
        assert_eq!(distance_score(24.9), 0.8);
        assert_eq!(distance_score(50.0), 0.6);
        assert_eq!(distance_score(99.0), 0.4);
        assert_eq!(distance_score(1000.0), 0.2);
    }

    #[tokio::test]
    async fn test_both_remote_skips_geocoding() {
        let (scorer, geocoder) = scorer_with(&[]);
        assert_eq!(scorer.score("Remote", "Anywhere").await, 1.0);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_remote_is_half() {
        let (scorer, _) = scorer_with(&[]);
        assert_eq!(scorer.score("Remote", "Berlin").await, 0.5);
        assert_eq!(scorer.score("Berlin", "remote").await, 0.5);
    }

    #[tokio::test]
    async fn test_geocode_failure_fails_open() {
        let (scorer, _) = scorer_with(&[("Berlin", 52.52, 13.405)]);
        assert_eq!(scorer.score("Berlin", "Atlantis").await, DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_empty_location_defaults_without_lookup() {
        let (scorer, geocoder) = scorer_with(&[]);
        assert_eq!(scorer.score("", "Berlin").await, DEFAULT_SCORE);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nearby_cities_bucket() {
        let (scorer, _) = scorer_with(&[("Berlin", 52.52, 13.405), ("Potsdam", 52.3906, 13.0645)]);
        assert_eq!(scorer.score("Berlin", "Potsdam").await, 0.6);
    }

    #[tokio::test]
    async fn test_distant_cities_bucket() {
        let (scorer, _) = scorer_with(&[("Berlin", 52.52, 13.405), ("Munich", 48.1351, 11.582)]);
        assert_eq!(scorer.score("Berlin", "Munich").await, FAR_SCORE);
    }

    #[tokio::test]
    async fn test_resolved_anchor_is_reused() {
        let (scorer, geocoder) = scorer_with(&[
            ("Berlin", 52.52, 13.405),
            ("Potsdam", 52.3906, 13.0645),
            ("Munich", 48.1351, 11.582),
        ]);
        let anchor = scorer.resolve("Berlin").await;
        assert_eq!(scorer.score_from(&anchor, "Potsdam").await, 0.6);
        assert_eq!(scorer.score_from(&anchor, "Munich").await, FAR_SCORE);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unresolved_anchor_skips_candidate_lookup() {
        let (scorer, geocoder) = scorer_with(&[("Berlin", 52.52, 13.405)]);
        let anchor = scorer.resolve("Atlantis").await;
        assert_eq!(scorer.score_from(&anchor, "Berlin").await, DEFAULT_SCORE);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }
}
