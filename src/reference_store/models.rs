//! Reference data models.
//!
//! These mirror the music-encyclopedia reference dump: MusicBrainz issues
//! the canonical identifiers, Spotify enrichment is bolted on where the
//! periodic ingestion managed to cross-reference it. Enrichment fields are
//! nullable throughout; an artist without Spotify data is still a fully
//! valid canonical identity.

use serde::{Deserialize, Serialize};

/// A deduplicated artist identity from the reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalArtist {
    /// MusicBrainz artist id, immutable once assigned.
    pub mbid: String,
    pub name: String,
    /// MusicBrainz disambiguation comment ("UK rock band", "rapper").
    pub disambiguation: Option<String>,
    pub spotify_id: Option<String>,
    /// Spotify popularity 0-100.
    pub popularity: Option<u8>,
    pub genres: Vec<String>,
}

/// A canonical recording (song/track) from the reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecording {
    /// MusicBrainz recording id.
    pub mbid: String,
    pub title: String,
    pub artist_mbid: String,
    pub duration_ms: Option<u32>,
    /// Industry recording code. Globally unique per recording master;
    /// authoritative for equivalence with the Spotify catalog when present.
    pub isrc: Option<String>,
    pub spotify_id: Option<String>,
    pub tempo: Option<f32>,
    /// 1 = major, 0 = minor, as Spotify audio analysis reports it.
    pub mode: Option<i32>,
    pub energy: Option<f32>,
    pub valence: Option<f32>,
}
