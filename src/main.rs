use anyhow::{Context, Result};
use canta::collaborative::{
    CollaborativeSuggester, KaraokeUserPopulation, ScrobbleNeighbourPopulation, TastePopulation,
};
use canta::config::{AppConfig, CliConfig, FileConfig};
use canta::identity::IdentityResolver;
use canta::preferences::{PreferenceAggregator, SqlitePreferenceStore};
use canta::recommend::{RecommendationEngine, RecommendationFilters};
use canta::reference_store::SqliteReferenceStore;
use canta::songbook_store::SqliteSongbookStore;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

/// Compute categorized karaoke song recommendations for a user.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite reference database (canonical artists/recordings).
    #[clap(value_parser = parse_path)]
    pub reference_db: PathBuf,

    /// Path to the SQLite songbook database (singable-song catalog).
    #[clap(value_parser = parse_path)]
    pub songbook_db: PathBuf,

    /// Path to the SQLite user preference database.
    #[clap(value_parser = parse_path)]
    pub preferences_db: PathBuf,

    /// The user to recommend for.
    #[clap(long)]
    pub user: String,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the scrobble neighbourhood service.
    #[clap(long)]
    pub neighbours_url: Option<String>,

    /// Timeout for neighbourhood service requests, in seconds.
    #[clap(long, default_value_t = 10)]
    pub neighbours_timeout_sec: u64,

    /// Only recommend songs at or above this catalog popularity (0-100).
    #[clap(long)]
    pub min_popularity: Option<u8>,

    /// Only recommend songs at or below this catalog popularity (0-100).
    #[clap(long)]
    pub max_popularity: Option<u8>,

    /// Skip songs flagged as explicit.
    #[clap(long)]
    pub exclude_explicit: bool,

    /// Minimum song duration in seconds.
    #[clap(long)]
    pub min_duration_sec: Option<u32>,

    /// Maximum song duration in seconds.
    #[clap(long)]
    pub max_duration_sec: Option<u32>,

    /// Only recommend songs marked as classics.
    #[clap(long)]
    pub classics_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!("canta {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH"));

    let file_config = cli_args.config.as_ref().map(FileConfig::load).transpose()?;
    let config = AppConfig::resolve(
        &CliConfig {
            reference_db: Some(cli_args.reference_db.clone()),
            songbook_db: Some(cli_args.songbook_db.clone()),
            preferences_db: Some(cli_args.preferences_db.clone()),
            neighbours_url: cli_args.neighbours_url.clone(),
            neighbours_timeout_sec: cli_args.neighbours_timeout_sec,
        },
        file_config,
    )?;

    info!("Opening reference database at {:?}...", config.reference_db);
    let reference = Arc::new(SqliteReferenceStore::new(&config.reference_db)?);

    info!("Opening songbook database at {:?}...", config.songbook_db);
    let songbook = Arc::new(SqliteSongbookStore::new(&config.songbook_db)?);

    info!(
        "Opening preference database at {:?}...",
        config.preferences_db
    );
    let preferences = Arc::new(SqlitePreferenceStore::new(&config.preferences_db)?);

    let resolver = IdentityResolver::new(reference.clone());
    let aggregator = PreferenceAggregator::new(preferences.clone(), resolver);

    let mut populations: Vec<Arc<dyn TastePopulation>> =
        vec![Arc::new(KaraokeUserPopulation::new(preferences.clone()))];
    if let Some(url) = &config.neighbours_url {
        info!("Neighbourhood service configured at {}", url);
        populations.push(Arc::new(ScrobbleNeighbourPopulation::new(
            url.clone(),
            config.neighbours_timeout_sec,
        )?));
    }
    let suggester = CollaborativeSuggester::new(populations, config.collaborative.clone());

    let engine = RecommendationEngine::new(
        aggregator,
        suggester,
        songbook,
        reference,
        preferences,
        config.recommendation.clone(),
    );

    let filters = RecommendationFilters {
        min_popularity: cli_args.min_popularity,
        max_popularity: cli_args.max_popularity,
        exclude_explicit: cli_args.exclude_explicit,
        min_duration_sec: cli_args.min_duration_sec,
        max_duration_sec: cli_args.max_duration_sec,
        classics_only: cli_args.classics_only,
    };

    let recommendations = engine
        .score_and_categorize(&cli_args.user, &filters)
        .await
        .context("Failed to compute recommendations")?;

    println!("{}", serde_json::to_string_pretty(&recommendations)?);
    Ok(())
}
