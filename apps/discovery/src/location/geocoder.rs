use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A lookup that did not get an answer. Distinct from `Ok(None)`, which means
/// the service answered and knows no such place.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a free-form address to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` is a definite miss; `Err` is transient and worth retrying later.
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError>;

    /// `None` whatever the reason; callers fall back to a default score.
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        match self.lookup(address).await {
            Ok(Some(coords)) => {
                debug!("Geocoded '{address}' to ({}, {})", coords.lat, coords.lon);
                Some(coords)
            }
            Ok(None) => {
                debug!("No geocoding match for '{address}'");
                None
            }
            Err(e) => {
                warn!("Geocoding '{address}' failed: {e}");
                None
            }
        }
    }
}

/// Great-circle distance in kilometres (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let places: Vec<NominatimPlace> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(places.first().and_then(parse_place))
    }
}

fn parse_place(place: &NominatimPlace) -> Option<Coordinates> {
    Some(Coordinates {
        lat: place.lat.parse().ok()?,
        lon: place.lon.parse().ok()?,
    })
}
