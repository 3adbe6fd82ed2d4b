use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::location::geocoder::{Coordinates, GeocodeError, Geocoder};
use crate::text::normalize::normalize_text;

const KEY_PREFIX: &str = "geocode:";

/// Redis-backed cache in front of another geocoder.
///
/// Definite misses ("address not found") are cached too, so a bad address is not
/// re-queried on every discovery. Transient lookup errors are never cached.
/// Redis failures fall through to the inner geocoder.
pub struct CachedGeocoder<G> {
    inner: G,
    redis: redis::Client,
    ttl_secs: u64,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, redis: redis::Client, ttl_secs: u64) -> Self {
        Self {
            inner,
            redis,
            ttl_secs,
        }
    }

    async fn read(&self, key: &str) -> redis::RedisResult<Option<Option<Coordinates>>> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key).await?;
        Ok(cached.and_then(|raw| serde_json::from_str(&raw).ok()))
    }

    async fn write(&self, key: &str, value: Option<Coordinates>) -> redis::RedisResult<()> {
        let payload = serde_json::to_string(&value).unwrap_or_else(|_| "null".to_string());
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await
    }
}

pub fn cache_key(address: &str) -> String {
    format!("{KEY_PREFIX}{}", normalize_text(address))
}

/// The value worth caching for a lookup result, if any.
fn cache_entry(
    result: &Result<Option<Coordinates>, GeocodeError>,
) -> Option<Option<Coordinates>> {
    result.as_ref().ok().copied()
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn lookup(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let key = cache_key(address);

        match self.read(&key).await {
            Ok(Some(hit)) => {
                debug!("Geocode cache hit for '{address}'");
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!("Geocode cache read failed: {e}"),
        }

        let resolved = self.inner.lookup(address).await;

        if let Some(entry) = cache_entry(&resolved) {
            if let Err(e) = self.write(&key, entry).await {
                warn!("Geocode cache write failed: {e}");
            }
        }

        resolved
    }
}
