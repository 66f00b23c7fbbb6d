//! Runtime configuration loaded from an optional YAML file.
//!
//! All fields carry defaults, so the binary runs without any config file.
//! A partial file overrides only the keys it names; everything else keeps
//! its default. Defaults reproduce the pipeline's original operating
//! parameters:
//!
//! | Area | Defaults |
//! |------|----------|
//! | Keywords | 4 primary terms, 11 secondary terms |
//! | Discovery | 3 results per primary keyword, 2 per secondary, fallback below 5 candidates |
//! | RSS | 13 feeds, lookback 0 days (today only), 3-day feed cool-down |
//! | Generation | `http://localhost:11434`, model `mistral`, `ollama serve` spawn, 5 s settle |
//! | Storage | `esg_radar.db` (SQLite) |
//! | Server | `127.0.0.1:8080`, gallery directory `iaq_gallery` |

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level runtime configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Path of the SQLite database file.
    pub database_path: String,
    /// Bind address for the read API server.
    pub bind_addr: String,
    /// Directory of decorative gallery images served by the HTML view.
    pub gallery_dir: String,
    /// Primary keyword tier: a hit here tags the article "first priority".
    pub first_priority_keywords: Vec<String>,
    /// Secondary keyword tier, checked only when no primary keyword matches.
    pub second_priority_keywords: Vec<String>,
    /// Fixed list of RSS feed URLs polled by the RSS discovery path.
    pub rss_feeds: Vec<String>,
    /// How many days back an RSS entry may have been published and still
    /// be ingested. 0 keeps entries published today (UTC).
    pub lookback_days: i64,
    /// Skip an entire feed when any of its articles was ingested within
    /// this many trailing days. 0 disables the throttle.
    pub feed_cooldown_days: i64,
    /// Search result links collected per primary keyword.
    pub search_results_per_primary: usize,
    /// Search result links collected per secondary keyword (fallback pass).
    pub search_results_per_secondary: usize,
    /// Secondary keywords are queried only while the candidate list holds
    /// fewer URLs than this.
    pub min_search_candidates: usize,
    /// Local generation service settings.
    pub generation: GenerationConfig,
}

/// Settings for the local text-generation service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Model name sent with every completion request.
    pub model: String,
    /// Command spawned when the service probe fails, e.g. `["ollama", "serve"]`.
    pub spawn_command: Vec<String>,
    /// Seconds to wait after spawning the service before proceeding.
    pub settle_secs: u64,
    /// Timeout in seconds for the health probe request.
    pub probe_timeout_secs: u64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            database_path: "esg_radar.db".to_string(),
            bind_addr: "127.0.0.1:8080".to_string(),
            gallery_dir: "iaq_gallery".to_string(),
            first_priority_keywords: vec![
                "indoor air quality".to_string(),
                "internet of things and air".to_string(),
                "AIoT air monitoring".to_string(),
                "environmental sensors for air quality".to_string(),
            ],
            second_priority_keywords: vec![
                "IoT".to_string(),
                "air quality".to_string(),
                "AI".to_string(),
                "AIoT".to_string(),
                "emissions".to_string(),
                "smart devices".to_string(),
                "HVAC".to_string(),
                "environmental monitoring".to_string(),
                "sustainability".to_string(),
                "ESG".to_string(),
                "carbon footprint".to_string(),
            ],
            rss_feeds: vec![
                "https://news.google.com/rss/search?q=ESG+air+quality".to_string(),
                "https://www.environmentalleader.com/feed/".to_string(),
                "https://cleantechnica.com/feed/".to_string(),
                "https://esgtoday.com/feed".to_string(),
                "https://knowesg.com/rss.xml".to_string(),
                "https://esgpro.co.uk/feed".to_string(),
                "https://advanceesg.org/feed".to_string(),
                "https://www.esginvestor.net/feed".to_string(),
                "https://airqualitynews.com/feed".to_string(),
                "https://www.sciencedaily.com/rss/earth_climate/air_quality.xml".to_string(),
                "https://smartairfilters.com/en/feed".to_string(),
                "https://www.epa.gov/indoorairplus/indoor-airplus-mobile-app-rss-podcast-feed-xml-file"
                    .to_string(),
                "https://www.greenbuildermedia.com/healthy-homes-indoor-air-quality-subscription-page"
                    .to_string(),
            ],
            lookback_days: 0,
            feed_cooldown_days: 3,
            search_results_per_primary: 3,
            search_results_per_secondary: 2,
            min_search_candidates: 5,
            generation: GenerationConfig::default(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mistral".to_string(),
            spawn_command: vec!["ollama".to_string(), "serve".to_string()],
            settle_secs: 5,
            probe_timeout_secs: 2,
        }
    }
}

/// Load configuration from a YAML file, falling back to defaults.
///
/// A missing path (or `None`) yields the built-in defaults. A present but
/// malformed file is an error.
///
/// # Arguments
///
/// * `path` - Optional path to a `config.yaml`
pub fn load(path: Option<&str>) -> Result<RadarConfig> {
    let Some(path) = path else {
        return Ok(RadarConfig::default());
    };
    if !Path::new(path).exists() {
        info!(%path, "Config file not found; using defaults");
        return Ok(RadarConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {path}"))?;
    let config: RadarConfig =
        serde_yaml::from_str(&raw).with_context(|| format!("failed to parse {path}"))?;
    info!(%path, "Loaded configuration");
    Ok(config)
}
