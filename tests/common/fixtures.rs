//! Test fixture creation for the reference, songbook and preference
//! databases. Everything goes through the stores' own insert helpers so
//! the normalized comparison keys are computed exactly as in production.

use anyhow::Result;
use canta::preferences::{PreferenceSource, SqlitePreferenceStore, UserPreferenceRecord};
use canta::reference_store::{CanonicalArtist, CanonicalRecording, SqliteReferenceStore};
use canta::songbook_store::{SongbookEntry, SqliteSongbookStore};
use std::path::PathBuf;
use tempfile::TempDir;

pub fn artist(
    mbid: &str,
    name: &str,
    spotify_id: Option<&str>,
    popularity: Option<u8>,
) -> CanonicalArtist {
    CanonicalArtist {
        mbid: mbid.to_string(),
        name: name.to_string(),
        disambiguation: None,
        spotify_id: spotify_id.map(|s| s.to_string()),
        popularity,
        genres: vec![],
    }
}

pub fn recording(
    mbid: &str,
    title: &str,
    artist_mbid: &str,
    isrc: Option<&str>,
) -> CanonicalRecording {
    CanonicalRecording {
        mbid: mbid.to_string(),
        title: title.to_string(),
        artist_mbid: artist_mbid.to_string(),
        duration_ms: Some(240_000),
        isrc: isrc.map(|s| s.to_string()),
        spotify_id: None,
        tempo: None,
        mode: None,
        energy: Some(0.7),
        valence: None,
    }
}

pub fn songbook_entry(id: &str, title: &str, artist_name: &str) -> SongbookEntry {
    SongbookEntry {
        id: id.to_string(),
        title: title.to_string(),
        artist_name: artist_name.to_string(),
        // Recomputed by the store on insert.
        artist_key: String::new(),
        popularity: 50,
        coverage_breadth: 5,
        is_classic: false,
        has_singable_version: true,
        duration_sec: Some(240),
        explicit: false,
        decade: Some(1980),
        isrc: None,
    }
}

pub fn preference(
    user_id: &str,
    artist_name: &str,
    source: PreferenceSource,
    rank: Option<u32>,
    playcount: Option<u64>,
) -> UserPreferenceRecord {
    UserPreferenceRecord {
        user_id: user_id.to_string(),
        artist_name: artist_name.to_string(),
        song_title: None,
        source,
        rank,
        playcount,
        period: None,
    }
}

/// A small reference database: three artists with Spotify enrichment and a
/// handful of recordings, one per well-known song.
pub fn create_test_reference(dir: &TempDir) -> Result<(SqliteReferenceStore, PathBuf)> {
    let path = dir.path().join("reference.db");
    let store = SqliteReferenceStore::new(&path)?;

    store.insert_artist(&artist("mb-queen", "Queen", Some("sp-queen"), Some(89)))?;
    store.insert_artist(&artist("mb-abba", "ABBA", Some("sp-abba"), Some(82)))?;
    store.insert_artist(&artist("mb-toto", "Toto", Some("sp-toto"), Some(71)))?;

    store.insert_recording(&recording(
        "mb-rec-bohemian",
        "Bohemian Rhapsody",
        "mb-queen",
        Some("GBUM71029604"),
    ))?;
    store.insert_recording(&recording(
        "mb-rec-dancing",
        "Dancing Queen",
        "mb-abba",
        Some("SEAYD7600037"),
    ))?;
    store.insert_recording(&recording("mb-rec-africa", "Africa", "mb-toto", None))?;

    Ok((store, path))
}

/// A songbook with songs for the reference artists plus crowd pleasers by
/// artists outside any test user's taste.
pub fn create_test_songbook(dir: &TempDir) -> Result<(SqliteSongbookStore, PathBuf)> {
    let path = dir.path().join("songbook.db");
    let store = SqliteSongbookStore::new(&path)?;

    let mut bohemian = songbook_entry("sb-bohemian", "Bohemian Rhapsody", "Queen");
    bohemian.popularity = 92;
    bohemian.coverage_breadth = 18;
    bohemian.is_classic = true;
    bohemian.decade = Some(1970);
    bohemian.duration_sec = Some(354);
    bohemian.isrc = Some("GBUM71029604".to_string());
    store.insert_entry(&bohemian)?;

    let mut champions = songbook_entry("sb-champions", "We Are the Champions", "Queen");
    champions.popularity = 85;
    champions.coverage_breadth = 14;
    champions.is_classic = true;
    champions.decade = Some(1970);
    store.insert_entry(&champions)?;

    let mut dancing = songbook_entry("sb-dancing", "Dancing Queen", "ABBA");
    dancing.popularity = 88;
    dancing.coverage_breadth = 16;
    dancing.is_classic = true;
    dancing.decade = Some(1970);
    dancing.isrc = Some("SEAYD7600037".to_string());
    store.insert_entry(&dancing)?;

    let mut africa = songbook_entry("sb-africa", "Africa", "Toto");
    africa.popularity = 75;
    africa.coverage_breadth = 12;
    store.insert_entry(&africa)?;

    let mut caroline = songbook_entry("sb-caroline", "Sweet Caroline", "Neil Diamond");
    caroline.popularity = 80;
    caroline.coverage_breadth = 20;
    caroline.is_classic = true;
    caroline.decade = Some(1960);
    store.insert_entry(&caroline)?;

    let mut wonderwall = songbook_entry("sb-wonderwall", "Wonderwall", "Oasis");
    wonderwall.popularity = 78;
    wonderwall.coverage_breadth = 15;
    wonderwall.decade = Some(1990);
    store.insert_entry(&wonderwall)?;

    Ok((store, path))
}

/// An empty preference database ready for per-test records.
pub fn create_test_preferences(dir: &TempDir) -> Result<(SqlitePreferenceStore, PathBuf)> {
    let path = dir.path().join("preferences.db");
    let store = SqlitePreferenceStore::new(&path)?;
    Ok((store, path))
}
