//! Songbook link maintenance CLI.
//!
//! Runs the linker pass that resolves songbook entries to canonical
//! recordings. Dry-run by default; pass --apply to write links.

use anyhow::{Context, Result};
use canta::reference_store::SqliteReferenceStore;
use canta::songbook_store::{LinkMode, SongbookLinker, SqliteSongbookStore};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite songbook database.
    pub songbook_db: PathBuf,

    /// Path to the SQLite reference database.
    pub reference_db: PathBuf,

    /// Write links instead of reporting what would change.
    #[clap(long)]
    pub apply: bool,

    /// Maximum entries to process in this pass.
    #[clap(long, default_value_t = 5000)]
    pub batch_size: usize,
}

fn main() -> Result<()> {
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

    let songbook = Arc::new(
        SqliteSongbookStore::new(&cli_args.songbook_db)
            .context("Failed to open songbook database")?,
    );
    let reference = Arc::new(
        SqliteReferenceStore::new(&cli_args.reference_db)
            .context("Failed to open reference database")?,
    );

    let mode = if cli_args.apply {
        LinkMode::Actual
    } else {
        info!("Dry-run mode; pass --apply to write links");
        LinkMode::DryRun
    };

    let linker = SongbookLinker::new(songbook, reference);
    let report = linker.run(mode, cli_args.batch_size)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
