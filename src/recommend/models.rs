//! Recommendation output models and request filters.
//!
//! Candidates are transient per-request values; nothing here is persisted.

use crate::songbook_store::SongbookEntry;
use serde::{Deserialize, Serialize};

/// The single strongest signal behind a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    KnownArtist,
    SimilarGenre,
    DecadeMatch,
    CrowdPleaser,
    Popular,
    GenerateKaraoke,
}

/// One scored song suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationCandidate {
    /// Songbook entry id; absent for synthetic create-your-own candidates.
    pub entry_id: Option<String>,
    pub title: Option<String>,
    pub artist_name: String,
    /// Always within [0, 1].
    pub score: f64,
    pub reason: ReasonCode,
    pub reason_text: String,
    pub popularity: u8,
    pub coverage_breadth: u32,
    pub is_classic: bool,
    pub has_singable_version: bool,
    pub duration_sec: Option<u32>,
    pub explicit: bool,
}

/// Request-time filters. Applied before any bucket capping, so a cap can
/// never hide results that matched the filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationFilters {
    pub min_popularity: Option<u8>,
    pub max_popularity: Option<u8>,
    pub exclude_explicit: bool,
    pub min_duration_sec: Option<u32>,
    pub max_duration_sec: Option<u32>,
    pub classics_only: bool,
}

impl RecommendationFilters {
    pub fn accepts(&self, entry: &SongbookEntry) -> bool {
        if let Some(min) = self.min_popularity {
            if entry.popularity < min {
                return false;
            }
        }
        if let Some(max) = self.max_popularity {
            if entry.popularity > max {
                return false;
            }
        }
        if self.exclude_explicit && entry.explicit {
            return false;
        }
        if let Some(min) = self.min_duration_sec {
            if entry.duration_sec.map_or(true, |d| d < min) {
                return false;
            }
        }
        if let Some(max) = self.max_duration_sec {
            if entry.duration_sec.map_or(true, |d| d > max) {
                return false;
            }
        }
        if self.classics_only && !entry.is_classic {
            return false;
        }
        true
    }
}

/// Output bucket identifiers, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    FromArtistsYouKnow,
    NewDiscoveries,
    CrowdPleasers,
    CreateYourOwn,
}

impl CategoryId {
    pub fn title(&self) -> &'static str {
        match self {
            CategoryId::FromArtistsYouKnow => "From artists you know",
            CategoryId::NewDiscoveries => "New discoveries",
            CategoryId::CrowdPleasers => "Crowd pleasers",
            CategoryId::CreateYourOwn => "Create your own",
        }
    }
}

/// One named, internally sorted bucket of candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub id: CategoryId,
    pub title: String,
    pub candidates: Vec<RecommendationCandidate>,
}

/// The full categorized response. Every bucket is always present, possibly
/// empty; the API layer never has to special-case a missing category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedRecommendations {
    pub user_id: String,
    pub categories: Vec<CategoryBucket>,
}

impl CategorizedRecommendations {
    pub fn bucket(&self, id: CategoryId) -> Option<&CategoryBucket> {
        self.categories.iter().find(|c| c.id == id)
    }
}
