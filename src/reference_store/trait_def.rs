//! ReferenceStore trait definition.
//!
//! Read-only view over the music-encyclopedia reference data. The identity
//! resolver accepts this trait rather than a concrete store so tests can
//! substitute an in-memory fake.

use super::models::{CanonicalArtist, CanonicalRecording};
use anyhow::Result;

pub trait ReferenceStore: Send + Sync {
    /// Point lookup of an artist by canonical id.
    fn get_artist(&self, mbid: &str) -> Result<Option<CanonicalArtist>>;

    /// All artists whose normalized name equals the given key.
    /// Common names collide ("america"), so this returns every holder.
    fn get_artists_by_normalized_name(&self, key: &str) -> Result<Vec<CanonicalArtist>>;

    /// Point lookup of a recording by canonical id.
    fn get_recording(&self, mbid: &str) -> Result<Option<CanonicalRecording>>;

    /// All recordings whose normalized title equals the given key.
    fn get_recordings_by_normalized_title(&self, key: &str) -> Result<Vec<CanonicalRecording>>;

    /// Cross-reference lookup: ISRC code to recording.
    fn get_recording_by_isrc(&self, isrc: &str) -> Result<Option<CanonicalRecording>>;

    /// Cross-reference lookup: Spotify artist id to canonical artist id.
    fn get_artist_mbid_by_spotify_id(&self, spotify_id: &str) -> Result<Option<String>>;

    /// Normalized artist name keys with length in `[min_len, max_len]`.
    /// Candidate narrowing for the fuzzy resolution tier.
    fn find_artist_keys_by_length(&self, min_len: usize, max_len: usize) -> Result<Vec<String>>;

    /// Normalized recording title keys with length in `[min_len, max_len]`.
    fn find_recording_keys_by_length(&self, min_len: usize, max_len: usize)
        -> Result<Vec<String>>;
}
