//! SQLite-backed reference store.
//!
//! The reference database is produced by the periodic ingestion pipeline
//! and is read-only at request time. The insert methods here exist for the
//! ingestion side and for test fixtures; they are deliberately not part of
//! the `ReferenceStore` trait the engines see.
//!
//! Name indexing uses the alias-folded comparison key, so "Guns N' Roses"
//! and "Guns and Roses" land on the same index row.

use super::models::{CanonicalArtist, CanonicalRecording};
use super::schema::REFERENCE_SCHEMA;
use super::trait_def::ReferenceStore;
use crate::normalize::{alias_key, normalize_title};
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqliteReferenceStore {
    conn: Arc<Mutex<Connection>>,
}

fn create_or_validate(conn: &Connection) -> Result<()> {
    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating reference db schema");
        REFERENCE_SCHEMA.create(conn)?;
        return Ok(());
    }

    REFERENCE_SCHEMA.validate(conn)
}

fn artist_from_row(row: &Row) -> rusqlite::Result<CanonicalArtist> {
    let genres_json: Option<String> = row.get("genres")?;
    let genres = genres_json
        .as_deref()
        .and_then(|j| serde_json::from_str(j).ok())
        .unwrap_or_default();
    Ok(CanonicalArtist {
        mbid: row.get("mbid")?,
        name: row.get("name")?,
        disambiguation: row.get("disambiguation")?,
        spotify_id: row.get("spotify_id")?,
        popularity: row.get::<_, Option<i64>>("popularity")?.map(|p| p as u8),
        genres,
    })
}

fn recording_from_row(row: &Row) -> rusqlite::Result<CanonicalRecording> {
    Ok(CanonicalRecording {
        mbid: row.get("mbid")?,
        title: row.get("title")?,
        artist_mbid: row.get("artist_mbid")?,
        duration_ms: row.get::<_, Option<i64>>("duration_ms")?.map(|d| d as u32),
        isrc: row.get("isrc")?,
        spotify_id: row.get("spotify_id")?,
        tempo: row.get("tempo")?,
        mode: row.get("mode")?,
        energy: row.get("energy")?,
        valence: row.get("valence")?,
    })
}

const ARTIST_COLUMNS: &str =
    "mbid, name, disambiguation, spotify_id, popularity, genres";
const RECORDING_COLUMNS: &str =
    "mbid, title, artist_mbid, duration_ms, isrc, spotify_id, tempo, mode, energy, valence";

impl SqliteReferenceStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .context("Failed to open reference database")?;
        create_or_validate(&conn)?;

        let artist_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ref_artists", [], |r| r.get(0))
            .unwrap_or(0);
        let recording_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM ref_recordings", [], |r| r.get(0))
            .unwrap_or(0);
        info!(
            "Opened reference db: {} artists, {} recordings",
            artist_count, recording_count
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert an artist row. Ingestion/fixture helper, not on the trait.
    pub fn insert_artist(&self, artist: &CanonicalArtist) -> Result<()> {
        let genres_json = if artist.genres.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&artist.genres)?)
        };
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ref_artists \
             (mbid, name, normalized_name, disambiguation, spotify_id, popularity, genres) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                artist.mbid,
                artist.name,
                alias_key(&artist.name),
                artist.disambiguation,
                artist.spotify_id,
                artist.popularity.map(|p| p as i64),
                genres_json,
            ],
        )
        .with_context(|| format!("Failed to insert artist {}", artist.mbid))?;
        Ok(())
    }

    /// Insert a recording row. Ingestion/fixture helper, not on the trait.
    pub fn insert_recording(&self, recording: &CanonicalRecording) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO ref_recordings \
             (mbid, title, normalized_title, artist_mbid, duration_ms, isrc, spotify_id, \
              tempo, mode, energy, valence) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                recording.mbid,
                recording.title,
                alias_key(&normalize_title(&recording.title)),
                recording.artist_mbid,
                recording.duration_ms.map(|d| d as i64),
                recording.isrc,
                recording.spotify_id,
                recording.tempo,
                recording.mode,
                recording.energy,
                recording.valence,
            ],
        )
        .with_context(|| format!("Failed to insert recording {}", recording.mbid))?;
        Ok(())
    }

    fn keys_by_length(
        &self,
        table: &str,
        column: &str,
        min_len: usize,
        max_len: usize,
    ) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT {column} FROM {table} \
             WHERE length({column}) BETWEEN ?1 AND ?2 ORDER BY {column}"
        ))?;
        let keys = stmt
            .query_map(params![min_len as i64, max_len as i64], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

impl ReferenceStore for SqliteReferenceStore {
    fn get_artist(&self, mbid: &str) -> Result<Option<CanonicalArtist>> {
        let conn = self.conn.lock().unwrap();
        let artist = conn
            .query_row(
                &format!("SELECT {ARTIST_COLUMNS} FROM ref_artists WHERE mbid = ?1"),
                params![mbid],
                artist_from_row,
            )
            .optional()?;
        Ok(artist)
    }

    fn get_artists_by_normalized_name(&self, key: &str) -> Result<Vec<CanonicalArtist>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTIST_COLUMNS} FROM ref_artists \
             WHERE normalized_name = ?1 ORDER BY mbid"
        ))?;
        let artists = stmt
            .query_map(params![key], artist_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(artists)
    }

    fn get_recording(&self, mbid: &str) -> Result<Option<CanonicalRecording>> {
        let conn = self.conn.lock().unwrap();
        let recording = conn
            .query_row(
                &format!("SELECT {RECORDING_COLUMNS} FROM ref_recordings WHERE mbid = ?1"),
                params![mbid],
                recording_from_row,
            )
            .optional()?;
        Ok(recording)
    }

    fn get_recordings_by_normalized_title(&self, key: &str) -> Result<Vec<CanonicalRecording>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORDING_COLUMNS} FROM ref_recordings \
             WHERE normalized_title = ?1 ORDER BY mbid"
        ))?;
        let recordings = stmt
            .query_map(params![key], recording_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(recordings)
    }

    fn get_recording_by_isrc(&self, isrc: &str) -> Result<Option<CanonicalRecording>> {
        let conn = self.conn.lock().unwrap();
        let recording = conn
            .query_row(
                &format!(
                    "SELECT {RECORDING_COLUMNS} FROM ref_recordings \
                     WHERE isrc = ?1 ORDER BY mbid LIMIT 1"
                ),
                params![isrc],
                recording_from_row,
            )
            .optional()?;
        Ok(recording)
    }

    fn get_artist_mbid_by_spotify_id(&self, spotify_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let mbid = conn
            .query_row(
                "SELECT mbid FROM ref_artists WHERE spotify_id = ?1 ORDER BY mbid LIMIT 1",
                params![spotify_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(mbid)
    }

    fn find_artist_keys_by_length(&self, min_len: usize, max_len: usize) -> Result<Vec<String>> {
        self.keys_by_length("ref_artists", "normalized_name", min_len, max_len)
    }

    fn find_recording_keys_by_length(
        &self,
        min_len: usize,
        max_len: usize,
    ) -> Result<Vec<String>> {
        self.keys_by_length("ref_recordings", "normalized_title", min_len, max_len)
    }
}
