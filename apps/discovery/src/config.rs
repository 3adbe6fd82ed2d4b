use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::models::Source;
use crate::orchestrator::DiscoveryStrategy;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_GEOCODER_USER_AGENT: &str = concat!("job-discovery/", env!("CARGO_PKG_VERSION"));

/// Engine configuration loaded from environment variables.
/// Only `DATABASE_URL` is required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Enables the geocode cache when set.
    pub redis_url: Option<String>,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_cache_ttl_secs: u64,
    pub scraper_user_agent: String,
    pub page_load_timeout: Duration,
    pub settle_delay: Duration,
    pub lightweight_source_timeout: Duration,
    pub browser_source_timeout: Duration,
    pub catalog_timeout: Duration,
    pub catalog_query_limit: usize,
    pub default_limit: usize,
    pub strategy: DiscoveryStrategy,
    /// External sources in the order their results are merged.
    pub enabled_sources: Vec<Source>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            database_url: require_env(&lookup, "DATABASE_URL")?,
            redis_url: lookup("REDIS_URL"),
            geocoder_url: lookup("GEOCODER_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string()),
            geocoder_user_agent: lookup("GEOCODER_USER_AGENT")
                .unwrap_or_else(|| DEFAULT_GEOCODER_USER_AGENT.to_string()),
            geocode_cache_ttl_secs: parse_env(&lookup, "GEOCODE_CACHE_TTL_SECS", 86_400)?,
            scraper_user_agent: lookup("SCRAPER_USER_AGENT")
                .unwrap_or_else(|| crate::fetch::http::DEFAULT_USER_AGENT.to_string()),
            page_load_timeout: Duration::from_secs(parse_env(
                &lookup,
                "PAGE_LOAD_TIMEOUT_SECS",
                30,
            )?),
            settle_delay: Duration::from_millis(parse_env(&lookup, "SETTLE_DELAY_MS", 3_000)?),
            lightweight_source_timeout: Duration::from_secs(parse_env(
                &lookup,
                "LIGHTWEIGHT_SOURCE_TIMEOUT_SECS",
                15,
            )?),
            browser_source_timeout: Duration::from_secs(parse_env(
                &lookup,
                "BROWSER_SOURCE_TIMEOUT_SECS",
                30,
            )?),
            catalog_timeout: Duration::from_secs(parse_env(&lookup, "CATALOG_TIMEOUT_SECS", 10)?),
            catalog_query_limit: parse_env(&lookup, "CATALOG_QUERY_LIMIT", 20)?,
            default_limit: parse_env(&lookup, "DISCOVERY_DEFAULT_LIMIT", 5)?,
            strategy: parse_env(&lookup, "DISCOVERY_STRATEGY", DiscoveryStrategy::DatabaseFirst)?,
            enabled_sources: match lookup("ENABLED_SOURCES") {
                Some(list) => parse_sources(&list)?,
                None => Source::EXTERNAL.to_vec(),
            },
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

/// Comma-separated source names; order is kept, duplicates and `catalog` are dropped.
fn parse_sources(list: &str) -> Result<Vec<Source>> {
    let mut sources = Vec::new();
    for name in list.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let source: Source = name
            .parse()
            .map_err(|e| anyhow!("ENABLED_SOURCES: {e}"))?;
        if source.is_external() && !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}
