//! Songbook models.
//!
//! A songbook entry is one singable song in the locally curated karaoke
//! catalog. A `CatalogLink` records the resolved equivalence between an
//! entry and a canonical recording, with its match provenance; the
//! confidence tiers are fixed per method and enforced at construction so a
//! corrupted row can never masquerade as a valid link.

use crate::identity::{CODE_CONFIDENCE, EXACT_NAME_CONFIDENCE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One singable song in the karaoke catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongbookEntry {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    /// Normalized artist name, the join key against merged preferences.
    pub artist_key: String,
    /// Catalog popularity 0-100.
    pub popularity: u8,
    /// How many independent publishers offer a singable version.
    pub coverage_breadth: u32,
    pub is_classic: bool,
    pub has_singable_version: bool,
    pub duration_sec: Option<u32>,
    pub explicit: bool,
    /// Release decade, e.g. 1980.
    pub decade: Option<u32>,
    pub isrc: Option<String>,
}

/// How a songbook entry was matched to a canonical recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    Code,
    ExactName,
    Unresolved,
}

impl LinkMethod {
    /// The only valid confidence for this method. There are no other tiers.
    pub fn confidence(&self) -> f64 {
        match self {
            LinkMethod::Code => CODE_CONFIDENCE,
            LinkMethod::ExactName => EXACT_NAME_CONFIDENCE,
            LinkMethod::Unresolved => 0.0,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            LinkMethod::Code => "code",
            LinkMethod::ExactName => "exact_name",
            LinkMethod::Unresolved => "unresolved",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "code" => Some(LinkMethod::Code),
            "exact_name" => Some(LinkMethod::ExactName),
            "unresolved" => Some(LinkMethod::Unresolved),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DataIntegrityViolation {
    #[error(
        "link for entry {entry_id}: method {method} requires confidence {expected}, found {found}"
    )]
    ConfidenceMismatch {
        entry_id: String,
        method: &'static str,
        expected: f64,
        found: f64,
    },

    #[error("link for entry {entry_id}: unknown match method {method:?}")]
    UnknownMethod { entry_id: String, method: String },

    #[error("link for entry {entry_id}: method {method} requires a recording id")]
    MissingRecording {
        entry_id: String,
        method: &'static str,
    },
}

/// Resolved equivalence between a songbook entry and a canonical recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogLink {
    pub entry_id: String,
    pub recording_mbid: Option<String>,
    pub spotify_id: Option<String>,
    pub method: LinkMethod,
    pub confidence: f64,
}

impl CatalogLink {
    /// Build a link; confidence is derived from the method, never supplied.
    pub fn new(
        entry_id: String,
        method: LinkMethod,
        recording_mbid: Option<String>,
        spotify_id: Option<String>,
    ) -> Result<Self, DataIntegrityViolation> {
        if method != LinkMethod::Unresolved && recording_mbid.is_none() {
            return Err(DataIntegrityViolation::MissingRecording {
                entry_id,
                method: method.to_db_str(),
            });
        }
        Ok(Self {
            entry_id,
            recording_mbid,
            spotify_id,
            confidence: method.confidence(),
            method,
        })
    }

    /// Rehydrate a link from stored parts, validating the confidence tier.
    /// A stored confidence that disagrees with its method is corruption and
    /// fails here rather than being coerced.
    pub fn from_parts(
        entry_id: String,
        method: &str,
        recording_mbid: Option<String>,
        spotify_id: Option<String>,
        confidence: f64,
    ) -> Result<Self, DataIntegrityViolation> {
        let Some(method) = LinkMethod::from_db_str(method) else {
            return Err(DataIntegrityViolation::UnknownMethod {
                entry_id,
                method: method.to_string(),
            });
        };
        let expected = method.confidence();
        if (confidence - expected).abs() > f64::EPSILON {
            return Err(DataIntegrityViolation::ConfidenceMismatch {
                entry_id,
                method: method.to_db_str(),
                expected,
                found: confidence,
            });
        }
        let mut link = Self::new(entry_id, method, recording_mbid, spotify_id)?;
        link.confidence = expected;
        Ok(link)
    }
}
