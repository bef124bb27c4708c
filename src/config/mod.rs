mod file_config;

pub use file_config::{CollaborativeConfig, FileConfig, RecommendationConfig, WeightsConfig};

use crate::collaborative::SuggestionSettings;
use crate::recommend::{RecommendationSettings, ScoringWeights};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments that can be overridden by the TOML config file.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub reference_db: Option<PathBuf>,
    pub songbook_db: Option<PathBuf>,
    pub preferences_db: Option<PathBuf>,
    pub neighbours_url: Option<String>,
    pub neighbours_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub reference_db: PathBuf,
    pub songbook_db: PathBuf,
    pub preferences_db: PathBuf,
    /// Neighbourhood service endpoint; collaborative suggestions fall back
    /// to the local user population alone when unset.
    pub neighbours_url: Option<String>,
    pub neighbours_timeout_sec: u64,
    pub collaborative: SuggestionSettings,
    pub recommendation: RecommendationSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let reference_db = file
            .reference_db
            .map(PathBuf::from)
            .or_else(|| cli.reference_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("reference_db must be specified via CLI or in config file")
            })?;
        let songbook_db = file
            .songbook_db
            .map(PathBuf::from)
            .or_else(|| cli.songbook_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("songbook_db must be specified via CLI or in config file")
            })?;
        let preferences_db = file
            .preferences_db
            .map(PathBuf::from)
            .or_else(|| cli.preferences_db.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("preferences_db must be specified via CLI or in config file")
            })?;

        // The reference and songbook dumps come from ingestion; running
        // against a missing file means a misconfigured deployment. The
        // preference db is created on first open instead.
        if !reference_db.exists() {
            bail!("Reference database does not exist: {:?}", reference_db);
        }
        if !songbook_db.exists() {
            bail!("Songbook database does not exist: {:?}", songbook_db);
        }

        let neighbours_url = file.neighbours_url.or_else(|| cli.neighbours_url.clone());
        let neighbours_timeout_sec = file
            .neighbours_timeout_sec
            .unwrap_or(cli.neighbours_timeout_sec);

        let collab_file = file.collaborative.unwrap_or_default();
        let defaults = SuggestionSettings::default();
        let collaborative = SuggestionSettings {
            min_shared: collab_file.min_shared.unwrap_or(defaults.min_shared),
            probe_cap: collab_file.probe_cap.unwrap_or(defaults.probe_cap),
            member_cap: collab_file.member_cap.unwrap_or(defaults.member_cap),
            timeout: collab_file
                .timeout_sec
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        };
        if collaborative.min_shared == 0 {
            bail!("collaborative.min_shared must be at least 1");
        }
        if collaborative.probe_cap == 0 {
            bail!("collaborative.probe_cap must be at least 1");
        }

        let rec_file = file.recommendation.unwrap_or_default();
        let defaults = RecommendationSettings::default();
        let weights_file = rec_file.weights.unwrap_or_default();
        let weight_defaults = ScoringWeights::default();
        let recommendation = RecommendationSettings {
            weights: ScoringWeights {
                known_artist: weights_file
                    .known_artist
                    .unwrap_or(weight_defaults.known_artist),
                taste_similarity: weights_file
                    .taste_similarity
                    .unwrap_or(weight_defaults.taste_similarity),
                decade_match: weights_file
                    .decade_match
                    .unwrap_or(weight_defaults.decade_match),
                energy_match: weights_file
                    .energy_match
                    .unwrap_or(weight_defaults.energy_match),
                popularity: weights_file.popularity.unwrap_or(weight_defaults.popularity),
                coverage: weights_file.coverage.unwrap_or(weight_defaults.coverage),
            },
            crowd_pleaser_min_coverage: rec_file
                .crowd_pleaser_min_coverage
                .unwrap_or(defaults.crowd_pleaser_min_coverage),
            crowd_pleaser_pool: rec_file
                .crowd_pleaser_pool
                .unwrap_or(defaults.crowd_pleaser_pool),
            coverage_scale_cap: rec_file
                .coverage_scale_cap
                .unwrap_or(defaults.coverage_scale_cap),
            known_bucket_cap: rec_file.known_bucket_cap.unwrap_or(defaults.known_bucket_cap),
            per_artist_cap: rec_file.per_artist_cap.unwrap_or(defaults.per_artist_cap),
            discovery_bucket_cap: rec_file
                .discovery_bucket_cap
                .unwrap_or(defaults.discovery_bucket_cap),
            crowd_bucket_cap: rec_file.crowd_bucket_cap.unwrap_or(defaults.crowd_bucket_cap),
            generate_bucket_cap: rec_file
                .generate_bucket_cap
                .unwrap_or(defaults.generate_bucket_cap),
        };
        if recommendation.coverage_scale_cap == 0 {
            bail!("recommendation.coverage_scale_cap must be at least 1");
        }

        Ok(Self {
            reference_db,
            songbook_db,
            preferences_db,
            neighbours_url,
            neighbours_timeout_sec,
            collaborative,
            recommendation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with_dbs(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            reference_db: Some(dir.join("reference.db")),
            songbook_db: Some(dir.join("songbook.db")),
            preferences_db: Some(dir.join("preferences.db")),
            neighbours_url: None,
            neighbours_timeout_sec: 10,
        }
    }

    fn touch(path: &std::path::Path) {
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_resolve_requires_existing_reference_db() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_with_dbs(dir.path());
        touch(&dir.path().join("songbook.db"));

        let err = AppConfig::resolve(&cli, None).unwrap_err().to_string();
        assert!(err.contains("Reference database"), "got: {err}");
    }

    #[test]
    fn test_file_config_overrides_cli() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_with_dbs(dir.path());
        touch(&dir.path().join("reference.db"));
        touch(&dir.path().join("songbook.db"));

        let file: FileConfig = toml::from_str(
            r#"
            neighbours_url = "http://from-file:8100"
            [collaborative]
            min_shared = 5
            "#,
        )
        .unwrap();

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();
        assert_eq!(
            config.neighbours_url.as_deref(),
            Some("http://from-file:8100")
        );
        assert_eq!(config.collaborative.min_shared, 5);
        // Untouched settings keep their defaults.
        assert_eq!(config.collaborative.probe_cap, 30);
    }

    #[test]
    fn test_zero_min_shared_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_with_dbs(dir.path());
        touch(&dir.path().join("reference.db"));
        touch(&dir.path().join("songbook.db"));

        let file: FileConfig = toml::from_str("[collaborative]\nmin_shared = 0").unwrap();
        assert!(AppConfig::resolve(&cli, Some(file)).is_err());
    }
}
