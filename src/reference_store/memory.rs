//! In-memory reference store.
//!
//! Backs unit tests and local development where a full reference database
//! dump isn't available. Same comparison-key semantics as the SQLite store.

use super::models::{CanonicalArtist, CanonicalRecording};
use super::trait_def::ReferenceStore;
use crate::normalize::{alias_key, normalize_title};
use anyhow::Result;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryReferenceStore {
    artists: RwLock<Vec<(String, CanonicalArtist)>>,
    recordings: RwLock<Vec<(String, CanonicalRecording)>>,
}

impl MemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_artist(&self, artist: CanonicalArtist) {
        let key = alias_key(&artist.name);
        self.artists.write().unwrap().push((key, artist));
    }

    pub fn add_recording(&self, recording: CanonicalRecording) {
        let key = alias_key(&normalize_title(&recording.title));
        self.recordings.write().unwrap().push((key, recording));
    }
}

impl ReferenceStore for MemoryReferenceStore {
    fn get_artist(&self, mbid: &str) -> Result<Option<CanonicalArtist>> {
        Ok(self
            .artists
            .read()
            .unwrap()
            .iter()
            .find(|(_, a)| a.mbid == mbid)
            .map(|(_, a)| a.clone()))
    }

    fn get_artists_by_normalized_name(&self, key: &str) -> Result<Vec<CanonicalArtist>> {
        let mut matches: Vec<CanonicalArtist> = self
            .artists
            .read()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, a)| a.clone())
            .collect();
        matches.sort_by(|a, b| a.mbid.cmp(&b.mbid));
        Ok(matches)
    }

    fn get_recording(&self, mbid: &str) -> Result<Option<CanonicalRecording>> {
        Ok(self
            .recordings
            .read()
            .unwrap()
            .iter()
            .find(|(_, r)| r.mbid == mbid)
            .map(|(_, r)| r.clone()))
    }

    fn get_recordings_by_normalized_title(&self, key: &str) -> Result<Vec<CanonicalRecording>> {
        let mut matches: Vec<CanonicalRecording> = self
            .recordings
            .read()
            .unwrap()
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, r)| r.clone())
            .collect();
        matches.sort_by(|a, b| a.mbid.cmp(&b.mbid));
        Ok(matches)
    }

    fn get_recording_by_isrc(&self, isrc: &str) -> Result<Option<CanonicalRecording>> {
        let mut matches: Vec<CanonicalRecording> = self
            .recordings
            .read()
            .unwrap()
            .iter()
            .filter(|(_, r)| r.isrc.as_deref() == Some(isrc))
            .map(|(_, r)| r.clone())
            .collect();
        matches.sort_by(|a, b| a.mbid.cmp(&b.mbid));
        Ok(matches.into_iter().next())
    }

    fn get_artist_mbid_by_spotify_id(&self, spotify_id: &str) -> Result<Option<String>> {
        let mut matches: Vec<String> = self
            .artists
            .read()
            .unwrap()
            .iter()
            .filter(|(_, a)| a.spotify_id.as_deref() == Some(spotify_id))
            .map(|(_, a)| a.mbid.clone())
            .collect();
        matches.sort();
        Ok(matches.into_iter().next())
    }

    fn find_artist_keys_by_length(&self, min_len: usize, max_len: usize) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .artists
            .read()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .filter(|k| {
                let len = k.chars().count();
                len >= min_len && len <= max_len
            })
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    fn find_recording_keys_by_length(
        &self,
        min_len: usize,
        max_len: usize,
    ) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .recordings
            .read()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .filter(|k| {
                let len = k.chars().count();
                len >= min_len && len <= max_len
            })
            .collect();
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
