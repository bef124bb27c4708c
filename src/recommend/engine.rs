//! Recommendation scoring and categorization.
//!
//! Top of the pipeline: merges preferences, gathers collaborative
//! suggestions, pulls candidate songs from the songbook, scores them with
//! a weighted sum of normalized signals and buckets the result. The whole
//! request is read-only; a user with no connected sources still gets the
//! crowd-pleaser bucket rather than an empty screen.

use super::models::{
    CategorizedRecommendations, CategoryBucket, CategoryId, ReasonCode, RecommendationCandidate,
    RecommendationFilters,
};
use crate::collaborative::{CollaborativeSuggester, KnownArtist};
use crate::preferences::{MergedArtistPreference, PreferenceAggregator, PreferenceStore};
use crate::reference_store::ReferenceStore;
use crate::songbook_store::{SongbookEntry, SongbookStore};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Signal weights for the scoring sum. The known-artist signal dominates
/// by design; collaborative similarity is the runner-up and the two never
/// apply to the same candidate.
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub known_artist: f64,
    pub taste_similarity: f64,
    pub decade_match: f64,
    pub energy_match: f64,
    pub popularity: f64,
    pub coverage: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            known_artist: 0.40,
            taste_similarity: 0.25,
            decade_match: 0.15,
            energy_match: 0.10,
            popularity: 0.20,
            coverage: 0.15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationSettings {
    pub weights: ScoringWeights,
    /// Coverage breadth at or above which a song counts as a crowd pleaser.
    pub crowd_pleaser_min_coverage: u32,
    /// How many crowd pleasers to pull before filtering.
    pub crowd_pleaser_pool: usize,
    /// Coverage breadth that saturates the coverage signal. Ratio-scaling
    /// against this cap keeps one catalog-ubiquitous song from dominating.
    pub coverage_scale_cap: u32,
    pub known_bucket_cap: usize,
    /// Per-artist cap inside the known bucket, for artist diversity.
    pub per_artist_cap: usize,
    pub discovery_bucket_cap: usize,
    pub crowd_bucket_cap: usize,
    pub generate_bucket_cap: usize,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            crowd_pleaser_min_coverage: 10,
            crowd_pleaser_pool: 40,
            coverage_scale_cap: 20,
            known_bucket_cap: 25,
            per_artist_cap: 3,
            discovery_bucket_cap: 15,
            crowd_bucket_cap: 15,
            generate_bucket_cap: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("failed to read preference data: {0}")]
    Preferences(#[source] anyhow::Error),

    /// The songbook couldn't answer for the user's own artists. Without the
    /// primary candidate set the response would be misleading, so this one
    /// escalates instead of degrading.
    #[error("songbook lookup failed for known artists: {0}")]
    Songbook(#[source] anyhow::Error),
}

/// Working state for one candidate entry while signals accumulate.
struct Draft {
    entry: SongbookEntry,
    known: bool,
    supporters: usize,
    crowd: bool,
    energy: Option<f32>,
}

pub struct RecommendationEngine {
    aggregator: PreferenceAggregator,
    suggester: CollaborativeSuggester,
    songbook: Arc<dyn SongbookStore>,
    reference: Arc<dyn ReferenceStore>,
    preferences: Arc<dyn PreferenceStore>,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(
        aggregator: PreferenceAggregator,
        suggester: CollaborativeSuggester,
        songbook: Arc<dyn SongbookStore>,
        reference: Arc<dyn ReferenceStore>,
        preferences: Arc<dyn PreferenceStore>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            aggregator,
            suggester,
            songbook,
            reference,
            preferences,
            settings,
        }
    }

    /// Compute the categorized suggestion list for a user.
    pub async fn score_and_categorize(
        &self,
        user_id: &str,
        filters: &RecommendationFilters,
    ) -> Result<CategorizedRecommendations, RecommendError> {
        let merged = self
            .aggregator
            .aggregate(user_id)
            .map_err(RecommendError::Preferences)?;

        // The quiz profile is an optional signal; a store hiccup here costs
        // the decade/energy signals, not the whole response.
        let profile = match self.preferences.get_taste_profile(user_id) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Taste profile unavailable for {}: {}", user_id, e);
                None
            }
        };

        let known_prefs: Vec<&MergedArtistPreference> = merged
            .values()
            .filter(|p| !p.excluded && !p.sources.is_empty())
            .collect();
        let excluded_keys: HashSet<&str> = merged
            .values()
            .filter(|p| p.excluded)
            .map(|p| p.name_key.as_str())
            .collect();
        let known_keys: HashSet<&str> =
            known_prefs.iter().map(|p| p.name_key.as_str()).collect();

        let known_artists: Vec<KnownArtist> =
            known_prefs.iter().map(|p| KnownArtist::from(*p)).collect();
        let suggestions = self.suggester.suggest(user_id, &known_artists).await;

        let mut drafts: BTreeMap<String, Draft> = BTreeMap::new();
        let mut generate: Vec<(String, u8)> = Vec::new();

        // Known artists are the primary candidate source; a songbook that
        // can't answer for them is a hard failure.
        for pref in &known_prefs {
            let entries = self
                .songbook
                .get_entries_by_artist_key(&pref.name_key)
                .map_err(RecommendError::Songbook)?;
            let mut any_singable = false;
            for entry in entries {
                if !entry.has_singable_version {
                    continue;
                }
                any_singable = true;
                drafts
                    .entry(entry.id.clone())
                    .or_insert_with(|| Draft {
                        entry,
                        known: false,
                        supporters: 0,
                        crowd: false,
                        energy: None,
                    })
                    .known = true;
            }
            if !any_singable {
                // The artist stays in the result as a create-your-own
                // suggestion instead of vanishing.
                generate.push((pref.display_name.clone(), pref.popularity.unwrap_or(0)));
            }
        }

        // Collaborative artists degrade per-artist: one bad lookup drops
        // that artist's songs, not the response.
        for (artist_key, suggestion) in &suggestions {
            if excluded_keys.contains(artist_key.as_str()) {
                continue;
            }
            let entries = match self.songbook.get_entries_by_artist_key(artist_key) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Skipping suggested artist {:?}: {}", artist_key, e);
                    continue;
                }
            };
            for entry in entries {
                if !entry.has_singable_version {
                    continue;
                }
                let draft = drafts.entry(entry.id.clone()).or_insert_with(|| Draft {
                    entry,
                    known: false,
                    supporters: 0,
                    crowd: false,
                    energy: None,
                });
                draft.supporters = suggestion.supporters.len();
            }
        }

        // Crowd-pleaser filler guarantees a non-empty response even for a
        // user with no signals at all.
        let crowd_pool = match self.songbook.get_crowd_pleasers(
            self.settings.crowd_pleaser_min_coverage,
            self.settings.crowd_pleaser_pool,
        ) {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Crowd-pleaser pool unavailable: {}", e);
                Vec::new()
            }
        };
        for entry in crowd_pool {
            if excluded_keys.contains(entry.artist_key.as_str()) {
                continue;
            }
            drafts
                .entry(entry.id.clone())
                .or_insert_with(|| Draft {
                    entry,
                    known: false,
                    supporters: 0,
                    crowd: false,
                    energy: None,
                })
                .crowd = true;
        }

        // Filters run before any capping.
        drafts.retain(|_, draft| filters.accepts(&draft.entry));

        // Audio-feature enrichment, only worth fetching when the profile
        // has an energy preference to compare against.
        if profile
            .as_ref()
            .and_then(|p| p.target_energy)
            .is_some()
        {
            for draft in drafts.values_mut() {
                draft.energy = self.lookup_energy(&draft.entry.id);
            }
        }

        let preferred_decades: &[u32] = profile
            .as_ref()
            .map(|p| p.preferred_decades.as_slice())
            .unwrap_or(&[]);
        let target_energy = profile.as_ref().and_then(|p| p.target_energy);

        let mut candidates: Vec<(RecommendationCandidate, bool, usize, bool)> = drafts
            .into_values()
            .map(|draft| {
                let candidate = self.score_candidate(&draft, preferred_decades, target_energy);
                (candidate, draft.known, draft.supporters, draft.crowd)
            })
            .collect();
        sort_candidates(&mut candidates);

        let response = self.categorize(user_id, candidates, generate, known_keys.is_empty());
        info!(
            "Recommendations for {}: {}",
            user_id,
            response
                .categories
                .iter()
                .map(|c| format!("{}={}", c.title, c.candidates.len()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(response)
    }

    /// Energy for an entry via its catalog link, best effort.
    fn lookup_energy(&self, entry_id: &str) -> Option<f32> {
        let link = match self.songbook.get_link(entry_id) {
            Ok(link) => link?,
            Err(e) => {
                debug!("Link lookup failed for {}: {}", entry_id, e);
                return None;
            }
        };
        let recording_mbid = link.recording_mbid?;
        match self.reference.get_recording(&recording_mbid) {
            Ok(recording) => recording.and_then(|r| r.energy),
            Err(e) => {
                debug!("Recording lookup failed for {}: {}", recording_mbid, e);
                None
            }
        }
    }

    fn score_candidate(
        &self,
        draft: &Draft,
        preferred_decades: &[u32],
        target_energy: Option<f32>,
    ) -> RecommendationCandidate {
        let weights = &self.settings.weights;
        let entry = &draft.entry;

        let known_signal = if draft.known { 1.0 } else { 0.0 };
        // Supporter count saturates quickly; three members agreeing is
        // already a strong cohort signal.
        let similarity_signal = if draft.supporters > 0 {
            (draft.supporters.min(3) as f64) / 3.0
        } else {
            0.0
        };
        let decade_signal = match entry.decade {
            Some(decade) if preferred_decades.contains(&decade) => 1.0,
            _ => 0.0,
        };
        // Neutral midpoint when either side of the comparison is missing.
        let energy_signal = match (draft.energy, target_energy) {
            (Some(energy), Some(target)) => {
                (1.0 - (f64::from(energy) - f64::from(target)).abs()).clamp(0.0, 1.0)
            }
            _ => 0.5,
        };
        let popularity_signal = f64::from(entry.popularity) / 100.0;
        let coverage_signal = f64::from(entry.coverage_breadth.min(self.settings.coverage_scale_cap))
            / f64::from(self.settings.coverage_scale_cap);

        let score = (weights.known_artist * known_signal
            + weights.taste_similarity * similarity_signal
            + weights.decade_match * decade_signal
            + weights.energy_match * energy_signal
            + weights.popularity * popularity_signal
            + weights.coverage * coverage_signal)
            .clamp(0.0, 1.0);

        // Reason = highest weighted contribution among the signals that map
        // to a reason code. Listed strongest-precedence first, so ties go
        // to the more specific explanation.
        let contributions = [
            (ReasonCode::KnownArtist, weights.known_artist * known_signal),
            (
                ReasonCode::SimilarGenre,
                weights.taste_similarity * similarity_signal,
            ),
            (ReasonCode::DecadeMatch, weights.decade_match * decade_signal),
            (ReasonCode::Popular, weights.popularity * popularity_signal),
            (ReasonCode::CrowdPleaser, weights.coverage * coverage_signal),
        ];
        let mut reason = ReasonCode::CrowdPleaser;
        let mut best_contribution = f64::MIN;
        for (code, contribution) in contributions {
            if contribution > best_contribution {
                best_contribution = contribution;
                reason = code;
            }
        }

        let reason_text = match reason {
            ReasonCode::KnownArtist => {
                format!("By {}, an artist you listen to", entry.artist_name)
            }
            ReasonCode::SimilarGenre => format!(
                "Loved by {} singers whose taste overlaps yours",
                draft.supporters
            ),
            ReasonCode::DecadeMatch => match entry.decade {
                Some(decade) => format!("Straight out of the {}s", decade),
                None => "Matches your favourite era".to_string(),
            },
            ReasonCode::Popular => "Riding high in the charts".to_string(),
            ReasonCode::CrowdPleaser => format!(
                "A karaoke staple across {} songbooks",
                entry.coverage_breadth
            ),
            ReasonCode::GenerateKaraoke => unreachable!("synthetic candidates built elsewhere"),
        };

        RecommendationCandidate {
            entry_id: Some(entry.id.clone()),
            title: Some(entry.title.clone()),
            artist_name: entry.artist_name.clone(),
            score,
            reason,
            reason_text,
            popularity: entry.popularity,
            coverage_breadth: entry.coverage_breadth,
            is_classic: entry.is_classic,
            has_singable_version: entry.has_singable_version,
            duration_sec: entry.duration_sec,
            explicit: entry.explicit,
        }
    }

    fn categorize(
        &self,
        user_id: &str,
        candidates: Vec<(RecommendationCandidate, bool, usize, bool)>,
        generate: Vec<(String, u8)>,
        no_known_artists: bool,
    ) -> CategorizedRecommendations {
        let mut known_bucket = Vec::new();
        let mut discovery_bucket = Vec::new();
        let mut crowd_bucket = Vec::new();
        let mut per_artist: BTreeMap<String, usize> = BTreeMap::new();

        for (candidate, known, supporters, crowd) in candidates {
            if known {
                if known_bucket.len() >= self.settings.known_bucket_cap {
                    continue;
                }
                let count = per_artist.entry(candidate.artist_name.clone()).or_insert(0);
                if *count >= self.settings.per_artist_cap {
                    continue;
                }
                *count += 1;
                known_bucket.push(candidate);
            } else if supporters > 0 {
                if discovery_bucket.len() < self.settings.discovery_bucket_cap {
                    discovery_bucket.push(candidate);
                }
            } else if crowd && crowd_bucket.len() < self.settings.crowd_bucket_cap {
                crowd_bucket.push(candidate);
            }
        }

        if no_known_artists {
            debug!(
                "User {} has no usable preference signals; crowd pleasers only",
                user_id
            );
        }

        let mut generate_bucket: Vec<RecommendationCandidate> = generate
            .into_iter()
            .map(|(artist_name, popularity)| {
                let score = (self.settings.weights.known_artist
                    + self.settings.weights.popularity * f64::from(popularity) / 100.0)
                    .clamp(0.0, 1.0);
                RecommendationCandidate {
                    entry_id: None,
                    title: None,
                    reason: ReasonCode::GenerateKaraoke,
                    reason_text: format!(
                        "No singable version yet. Generate a karaoke track for {}",
                        artist_name
                    ),
                    artist_name,
                    score,
                    popularity,
                    coverage_breadth: 0,
                    is_classic: false,
                    has_singable_version: false,
                    duration_sec: None,
                    explicit: false,
                }
            })
            .collect();
        generate_bucket.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.popularity.cmp(&a.popularity))
                .then_with(|| a.artist_name.cmp(&b.artist_name))
        });
        generate_bucket.truncate(self.settings.generate_bucket_cap);

        CategorizedRecommendations {
            user_id: user_id.to_string(),
            categories: vec![
                bucket(CategoryId::FromArtistsYouKnow, known_bucket),
                bucket(CategoryId::NewDiscoveries, discovery_bucket),
                bucket(CategoryId::CrowdPleasers, crowd_bucket),
                bucket(CategoryId::CreateYourOwn, generate_bucket),
            ],
        }
    }
}

fn bucket(id: CategoryId, candidates: Vec<RecommendationCandidate>) -> CategoryBucket {
    CategoryBucket {
        id,
        title: id.title().to_string(),
        candidates,
    }
}

/// Score descending, popularity descending, entry id ascending. Total and
/// deterministic; scores are finite by construction.
fn sort_candidates(candidates: &mut [(RecommendationCandidate, bool, usize, bool)]) {
    candidates.sort_by(|(a, ..), (b, ..)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.popularity.cmp(&a.popularity))
            .then_with(|| a.entry_id.cmp(&b.entry_id))
    });
}
