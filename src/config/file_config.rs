//! TOML configuration file support.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub reference_db: Option<String>,
    pub songbook_db: Option<String>,
    pub preferences_db: Option<String>,
    pub neighbours_url: Option<String>,
    pub neighbours_timeout_sec: Option<u64>,

    // Feature configs
    pub collaborative: Option<CollaborativeConfig>,
    pub recommendation: Option<RecommendationConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CollaborativeConfig {
    pub min_shared: Option<usize>,
    pub probe_cap: Option<usize>,
    pub member_cap: Option<usize>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RecommendationConfig {
    pub crowd_pleaser_min_coverage: Option<u32>,
    pub crowd_pleaser_pool: Option<usize>,
    pub coverage_scale_cap: Option<u32>,
    pub known_bucket_cap: Option<usize>,
    pub per_artist_cap: Option<usize>,
    pub discovery_bucket_cap: Option<usize>,
    pub crowd_bucket_cap: Option<usize>,
    pub generate_bucket_cap: Option<usize>,
    pub weights: Option<WeightsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct WeightsConfig {
    pub known_artist: Option<f64>,
    pub taste_similarity: Option<f64>,
    pub decade_match: Option<f64>,
    pub energy_match: Option<f64>,
    pub popularity: Option<f64>,
    pub coverage: Option<f64>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}
