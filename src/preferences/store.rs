//! SQLite-backed preference store.
//!
//! Also answers the shared-taste cohort query over its own user base: this
//! user population is one of the two the collaborative engine consults.

use super::models::{PreferenceSource, TasteProfile, UserPreferenceRecord};
use super::schema::PREFERENCES_SCHEMA;
use super::trait_def::PreferenceStore;
use crate::normalize::alias_key;
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub struct SqlitePreferenceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePreferenceStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .context("Failed to open preference database")?;

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |r| r.get(0),
            )
            .unwrap_or(0);
        if table_count == 0 {
            info!("Creating preference db schema");
            PREFERENCES_SCHEMA.create(&conn)?;
        } else {
            PREFERENCES_SCHEMA.validate(&conn)?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append one preference record. Sync-path/fixture helper.
    pub fn record_preference(&self, record: &UserPreferenceRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO preference_records \
             (user_id, artist_name, artist_key, song_title, source, rank, playcount, period) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.user_id,
                record.artist_name,
                alias_key(&record.artist_name),
                record.song_title,
                record.source.to_db_str(),
                record.rank.map(|r| r as i64),
                record.playcount.map(|p| p as i64),
                record.period,
            ],
        )
        .context("Failed to insert preference record")?;
        Ok(())
    }

    pub fn set_taste_profile(&self, profile: &TasteProfile) -> Result<()> {
        let decades_json = serde_json::to_string(&profile.preferred_decades)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO taste_profiles (user_id, preferred_decades, target_energy) \
             VALUES (?1, ?2, ?3) \
             ON CONFLICT(user_id) DO UPDATE SET \
                 preferred_decades = excluded.preferred_decades, \
                 target_energy = excluded.target_energy",
            params![profile.user_id, decades_json, profile.target_energy],
        )?;
        Ok(())
    }

    pub fn set_artist_excluded(&self, user_id: &str, artist_name: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO excluded_artists (user_id, artist_name) VALUES (?1, ?2)",
            params![user_id, artist_name],
        )?;
        Ok(())
    }

    /// Users (other than `exclude_user_id`) holding at least one of the
    /// probe artist keys, with their full artist sets.
    ///
    /// The probe set size is bounded by the SQL parameter limit, which is
    /// why callers cap it; the returned artist sets are complete regardless.
    pub fn find_users_sharing_artists(
        &self,
        probe_keys: &[String],
        exclude_user_id: &str,
        cap: usize,
    ) -> Result<Vec<(String, Vec<(String, String)>)>> {
        if probe_keys.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.conn.lock().unwrap();
        let placeholders = (2..probe_keys.len() + 2)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT user_id FROM preference_records \
             WHERE user_id != ?1 AND artist_key IN ({placeholders}) \
             ORDER BY user_id LIMIT {cap}"
        ))?;
        let members: Vec<String> = stmt
            .query_map(
                params_from_iter(
                    std::iter::once(exclude_user_id.to_string()).chain(probe_keys.iter().cloned()),
                ),
                |row| row.get(0),
            )?
            .collect::<std::result::Result<_, _>>()?;

        let mut artist_stmt = conn.prepare(
            "SELECT DISTINCT artist_name, artist_key FROM preference_records \
             WHERE user_id = ?1 ORDER BY artist_key",
        )?;
        let mut result = Vec::with_capacity(members.len());
        for member in members {
            let artists = artist_stmt
                .query_map(params![member], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<Vec<(String, String)>, _>>()?;
            result.push((member, artists));
        }
        Ok(result)
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get_preference_records(&self, user_id: &str) -> Result<Vec<UserPreferenceRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT user_id, artist_name, song_title, source, rank, playcount, period \
             FROM preference_records WHERE user_id = ?1",
        )?;
        let records = stmt
            .query_map(params![user_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                    row.get::<_, Option<i64>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        records
            .into_iter()
            .map(
                |(user_id, artist_name, song_title, source, rank, playcount, period)| {
                    let source = PreferenceSource::from_db_str(&source)
                        .ok_or_else(|| anyhow!("unknown preference source {source:?}"))?;
                    Ok(UserPreferenceRecord {
                        user_id,
                        artist_name,
                        song_title,
                        source,
                        rank: rank.map(|r| r as u32),
                        playcount: playcount.map(|p| p as u64),
                        period,
                    })
                },
            )
            .collect()
    }

    fn get_taste_profile(&self, user_id: &str) -> Result<Option<TasteProfile>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT preferred_decades, target_energy FROM taste_profiles WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<f32>>(1)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(decades_json, target_energy)| TasteProfile {
            user_id: user_id.to_string(),
            preferred_decades: decades_json
                .as_deref()
                .and_then(|j| serde_json::from_str(j).ok())
                .unwrap_or_default(),
            target_energy,
        }))
    }

    fn get_excluded_artists(&self, user_id: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT artist_name FROM excluded_artists WHERE user_id = ?1 ORDER BY artist_name",
        )?;
        let names = stmt
            .query_map(params![user_id], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        Ok(names)
    }
}
