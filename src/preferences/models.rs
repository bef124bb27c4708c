//! User preference models.
//!
//! A `UserPreferenceRecord` is one (user, artist-or-song, source) tuple as
//! written by the connector sync paths. The aggregator folds them into
//! `MergedArtistPreference`s, one per artist merge key, preserving every
//! source's contribution side by side.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Where a preference signal came from. Sources are never collapsed into
/// each other; a merged preference keeps one slot per source.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceSource {
    /// Spotify "top artists" ranked list.
    SpotifyRanked,
    /// Last.fm scrobble playcounts.
    LastfmPlaycount,
    /// Taste quiz selections.
    Quiz,
    /// Manually added by the user.
    Manual,
}

impl PreferenceSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PreferenceSource::SpotifyRanked => "spotify_ranked",
            PreferenceSource::LastfmPlaycount => "lastfm_playcount",
            PreferenceSource::Quiz => "quiz",
            PreferenceSource::Manual => "manual",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "spotify_ranked" => Some(PreferenceSource::SpotifyRanked),
            "lastfm_playcount" => Some(PreferenceSource::LastfmPlaycount),
            "quiz" => Some(PreferenceSource::Quiz),
            "manual" => Some(PreferenceSource::Manual),
            _ => None,
        }
    }
}

/// One preference signal for one artist (or song) from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferenceRecord {
    pub user_id: String,
    pub artist_name: String,
    /// Set when the signal is song-level (e.g. a top-tracks entry).
    pub song_title: Option<String>,
    pub source: PreferenceSource,
    /// 1-based rank, meaningful only within its source and period.
    pub rank: Option<u32>,
    pub playcount: Option<u64>,
    /// Source-specific period tag ("6month", "overall").
    pub period: Option<String>,
}

/// Quiz-derived taste settings, all optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TasteProfile {
    pub user_id: String,
    /// Preferred decades, e.g. [1980, 1990].
    pub preferred_decades: Vec<u32>,
    /// Preferred energy level in [0,1].
    pub target_energy: Option<f32>,
}

/// Merge key for an artist: the canonical id when resolution succeeded,
/// the normalized raw name otherwise. Unresolved data is kept, not
/// dropped, so a later reference ingestion can upgrade it in place.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtistKey {
    Canonical(String),
    Name(String),
}

impl ArtistKey {
    pub fn canonical(mbid: impl Into<String>) -> Self {
        ArtistKey::Canonical(mbid.into())
    }

    pub fn name(key: impl Into<String>) -> Self {
        ArtistKey::Name(key.into())
    }
}

impl fmt::Display for ArtistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtistKey::Canonical(mbid) => write!(f, "mb:{mbid}"),
            ArtistKey::Name(key) => write!(f, "name:{key}"),
        }
    }
}

impl Serialize for ArtistKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ArtistKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if let Some(mbid) = s.strip_prefix("mb:") {
            Ok(ArtistKey::Canonical(mbid.to_string()))
        } else if let Some(key) = s.strip_prefix("name:") {
            Ok(ArtistKey::Name(key.to_string()))
        } else {
            Err(serde::de::Error::custom(format!(
                "artist key without prefix: {s:?}"
            )))
        }
    }
}

/// All of one user's signals for one artist, merged across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedArtistPreference {
    pub key: ArtistKey,
    pub display_name: String,
    /// Normalized name, the probe/join key for populations and songbook.
    pub name_key: String,
    pub sources: BTreeSet<PreferenceSource>,
    /// Best (lowest) rank seen per source.
    pub rank_by_source: BTreeMap<PreferenceSource, u32>,
    /// Best (highest) playcount seen per source.
    pub playcount_by_source: BTreeMap<PreferenceSource, u64>,
    pub canonical_mbid: Option<String>,
    pub resolution_confidence: Option<f64>,
    pub spotify_id: Option<String>,
    /// Spotify popularity enrichment, when resolution found it.
    pub popularity: Option<u8>,
    /// User-suppressed. Kept in the set so the profile view can explain
    /// the suppression; scoring treats it as non-recommendable.
    pub excluded: bool,
}

impl MergedArtistPreference {
    /// Best rank across all sources, lower is stronger.
    pub fn best_rank(&self) -> Option<u32> {
        self.rank_by_source.values().min().copied()
    }

    /// Best playcount across all sources.
    pub fn best_playcount(&self) -> Option<u64> {
        self.playcount_by_source.values().max().copied()
    }
}
