//! SQLite-backed songbook store.

use super::models::{CatalogLink, LinkMethod, SongbookEntry};
use super::schema::SONGBOOK_SCHEMA;
use super::trait_def::{SongbookLinkStore, SongbookStore};
use crate::normalize::alias_key;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqliteSongbookStore {
    conn: Arc<Mutex<Connection>>,
}

const ENTRY_COLUMNS: &str = "id, title, artist_name, artist_key, popularity, coverage_breadth, \
     is_classic, has_singable_version, duration_sec, explicit, decade, isrc";

fn entry_from_row(row: &Row) -> rusqlite::Result<SongbookEntry> {
    Ok(SongbookEntry {
        id: row.get("id")?,
        title: row.get("title")?,
        artist_name: row.get("artist_name")?,
        artist_key: row.get("artist_key")?,
        popularity: row.get::<_, i64>("popularity")? as u8,
        coverage_breadth: row.get::<_, i64>("coverage_breadth")? as u32,
        is_classic: row.get::<_, i64>("is_classic")? != 0,
        has_singable_version: row.get::<_, i64>("has_singable_version")? != 0,
        duration_sec: row.get::<_, Option<i64>>("duration_sec")?.map(|d| d as u32),
        explicit: row.get::<_, i64>("explicit")? != 0,
        decade: row.get::<_, Option<i64>>("decade")?.map(|d| d as u32),
        isrc: row.get("isrc")?,
    })
}

impl SqliteSongbookStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .context("Failed to open songbook database")?;

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        if table_count == 0 {
            info!("Creating songbook db schema");
            SONGBOOK_SCHEMA.create(&conn)?;
        } else {
            SONGBOOK_SCHEMA.validate(&conn)?;
        }

        let entry_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM songbook_entries", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened songbook db: {} entries", entry_count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert an entry row. Ingestion/fixture helper, not on the trait.
    /// The artist key is computed here so callers can't desynchronize it.
    pub fn insert_entry(&self, entry: &SongbookEntry) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO songbook_entries \
             (id, title, artist_name, artist_key, popularity, coverage_breadth, is_classic, \
              has_singable_version, duration_sec, explicit, decade, isrc) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                entry.id,
                entry.title,
                entry.artist_name,
                alias_key(&entry.artist_name),
                entry.popularity as i64,
                entry.coverage_breadth as i64,
                entry.is_classic as i64,
                entry.has_singable_version as i64,
                entry.duration_sec.map(|d| d as i64),
                entry.explicit as i64,
                entry.decade.map(|d| d as i64),
                entry.isrc,
            ],
        )
        .with_context(|| format!("Failed to insert songbook entry {}", entry.id))?;
        Ok(())
    }
}

impl SongbookStore for SqliteSongbookStore {
    fn get_entry(&self, id: &str) -> Result<Option<SongbookEntry>> {
        let conn = self.conn.lock().unwrap();
        let entry = conn
            .query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM songbook_entries WHERE id = ?1"),
                params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn get_entries_by_artist_key(&self, artist_key: &str) -> Result<Vec<SongbookEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM songbook_entries \
             WHERE artist_key = ?1 ORDER BY popularity DESC, id ASC"
        ))?;
        let entries = stmt
            .query_map(params![artist_key], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get_crowd_pleasers(&self, min_coverage: u32, limit: usize) -> Result<Vec<SongbookEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM songbook_entries \
             WHERE coverage_breadth >= ?1 AND has_singable_version = 1 \
             ORDER BY coverage_breadth DESC, popularity DESC, id ASC LIMIT ?2"
        ))?;
        let entries = stmt
            .query_map(params![min_coverage as i64, limit as i64], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn get_link(&self, entry_id: &str) -> Result<Option<CatalogLink>> {
        let conn = self.conn.lock().unwrap();
        let parts = conn
            .query_row(
                "SELECT entry_id, recording_mbid, spotify_id, match_method, confidence \
                 FROM songbook_links WHERE entry_id = ?1",
                params![entry_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, f64>(4)?,
                    ))
                },
            )
            .optional()?;

        match parts {
            None => Ok(None),
            Some((entry_id, recording_mbid, spotify_id, method, confidence)) => {
                let link = CatalogLink::from_parts(
                    entry_id,
                    &method,
                    recording_mbid,
                    spotify_id,
                    confidence,
                )?;
                Ok(Some(link))
            }
        }
    }
}

impl SongbookLinkStore for SqliteSongbookStore {
    fn list_entries_needing_link(&self, limit: usize) -> Result<Vec<SongbookEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM songbook_entries e \
             WHERE NOT EXISTS (\
                 SELECT 1 FROM songbook_links l \
                 WHERE l.entry_id = e.id AND l.match_method = ?1\
             ) \
             ORDER BY e.id ASC LIMIT ?2"
        ))?;
        let entries = stmt
            .query_map(
                params![LinkMethod::Code.to_db_str(), limit as i64],
                entry_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn upsert_link(&self, link: &CatalogLink) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO songbook_links \
             (entry_id, recording_mbid, spotify_id, match_method, confidence) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(entry_id) DO UPDATE SET \
                 recording_mbid = excluded.recording_mbid, \
                 spotify_id = excluded.spotify_id, \
                 match_method = excluded.match_method, \
                 confidence = excluded.confidence, \
                 linked_at = cast(strftime('%s','now') as int)",
            params![
                link.entry_id,
                link.recording_mbid,
                link.spotify_id,
                link.method.to_db_str(),
                link.confidence,
            ],
        )
        .with_context(|| format!("Failed to upsert link for entry {}", link.entry_id))?;
        Ok(())
    }
}
