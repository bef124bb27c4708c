//! Identity resolution across the three identifier spaces.
//!
//! Free-text names (Last.fm history), Spotify catalog ids and ISRC codes
//! all need to land on the same canonical MusicBrainz identity before any
//! preference merging or scoring can happen. Resolution is read-only and a
//! miss is an ordinary `Ok(None)`: the caller decides whether to keep an
//! unresolved placeholder or drop the record.
//!
//! Confidence is tiered by identifier strength. ISRC codes are globally
//! unique per recording master; names collide across artists and eras
//! ("America" the band vs. the country), so a name hit can never be worth
//! as much as a code hit.

use crate::normalize::{alias_key, levenshtein, normalize, normalize_title};
use crate::reference_store::{CanonicalArtist, CanonicalRecording, ReferenceStore};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Confidence for a cross-reference code hit.
pub const CODE_CONFIDENCE: f64 = 0.95;
/// Confidence for an exact normalized-name hit.
pub const EXACT_NAME_CONFIDENCE: f64 = 0.80;
/// Confidence for a fuzzy name hit. Strictly below the exact tier.
pub const FUZZY_NAME_CONFIDENCE: f64 = 0.60;
/// Maximum edit distance the fuzzy tier will accept.
const FUZZY_MAX_DISTANCE: usize = 2;

/// How a resolution was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Code,
    ExactName,
    FuzzyName,
}

/// Which reference population a name is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePopulation {
    Artists,
    Recordings,
}

/// A resolved canonical identity with its match provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub mbid: String,
    pub name: String,
    pub spotify_id: Option<String>,
    /// Spotify popularity of the matched entity, when enriched.
    pub popularity: Option<u8>,
    pub confidence: f64,
    pub method: ResolutionMethod,
}

impl ResolvedIdentity {
    fn from_artist(artist: CanonicalArtist, method: ResolutionMethod, confidence: f64) -> Self {
        Self {
            mbid: artist.mbid,
            name: artist.name,
            spotify_id: artist.spotify_id,
            popularity: artist.popularity,
            confidence,
            method,
        }
    }

    fn from_recording(
        recording: CanonicalRecording,
        method: ResolutionMethod,
        confidence: f64,
    ) -> Self {
        Self {
            mbid: recording.mbid,
            name: recording.title,
            spotify_id: recording.spotify_id,
            // Recording rows carry no popularity of their own; the artist's
            // enrichment is the popularity signal downstream.
            popularity: None,
            confidence,
            method,
        }
    }
}

/// Resolves names and codes against the injected reference snapshot.
#[derive(Clone)]
pub struct IdentityResolver {
    reference: Arc<dyn ReferenceStore>,
}

impl IdentityResolver {
    pub fn new(reference: Arc<dyn ReferenceStore>) -> Self {
        Self { reference }
    }

    /// Resolve a recording by its cross-reference code.
    pub fn resolve_by_code(&self, isrc: &str) -> Result<Option<ResolvedIdentity>> {
        let hit = self.reference.get_recording_by_isrc(isrc.trim())?;
        Ok(hit.map(|recording| {
            debug!("Resolved isrc {} to recording {}", isrc, recording.mbid);
            ResolvedIdentity::from_recording(recording, ResolutionMethod::Code, CODE_CONFIDENCE)
        }))
    }

    /// Resolve a free-text name against the given reference population.
    ///
    /// The reference index is keyed by alias-folded comparison keys, so the
    /// plain normalized key is tried first and the alias key second (they
    /// differ only for names with folded spelling variants). The fuzzy tier
    /// runs last. Collisions are broken deterministically: higher Spotify
    /// popularity first, then lexical mbid order.
    pub fn resolve_by_name(
        &self,
        name: &str,
        population: NamePopulation,
    ) -> Result<Option<ResolvedIdentity>> {
        let plain = match population {
            NamePopulation::Artists => normalize(name),
            NamePopulation::Recordings => normalize_title(name),
        };
        if plain.is_empty() {
            return Ok(None);
        }

        if let Some(identity) = self.exact_lookup(&plain, population, EXACT_NAME_CONFIDENCE)? {
            return Ok(Some(identity));
        }

        let alias = alias_key(&plain);
        if alias != plain {
            if let Some(identity) = self.exact_lookup(&alias, population, EXACT_NAME_CONFIDENCE)? {
                return Ok(Some(identity));
            }
        }

        self.fuzzy_lookup(&alias, population)
    }

    /// Resolve a Spotify artist id to a canonical artist id. O(1) index hit.
    pub fn resolve_spotify_id(&self, spotify_id: &str) -> Result<Option<String>> {
        self.reference.get_artist_mbid_by_spotify_id(spotify_id)
    }

    fn exact_lookup(
        &self,
        key: &str,
        population: NamePopulation,
        confidence: f64,
    ) -> Result<Option<ResolvedIdentity>> {
        match population {
            NamePopulation::Artists => {
                let candidates = self.reference.get_artists_by_normalized_name(key)?;
                Ok(best_artist(candidates)
                    .map(|a| ResolvedIdentity::from_artist(a, ResolutionMethod::ExactName, confidence)))
            }
            NamePopulation::Recordings => {
                let candidates = self.reference.get_recordings_by_normalized_title(key)?;
                Ok(best_recording(candidates).map(|r| {
                    ResolvedIdentity::from_recording(r, ResolutionMethod::ExactName, confidence)
                }))
            }
        }
    }

    /// Fuzzy tier: nearest normalized key within `FUZZY_MAX_DISTANCE` edits,
    /// candidates narrowed to keys whose length is within the same window.
    fn fuzzy_lookup(
        &self,
        key: &str,
        population: NamePopulation,
    ) -> Result<Option<ResolvedIdentity>> {
        let key_len = key.chars().count();
        if key_len < 3 {
            // One edit rewrites too much of a very short key to trust.
            return Ok(None);
        }
        let min_len = key_len.saturating_sub(FUZZY_MAX_DISTANCE);
        let max_len = key_len + FUZZY_MAX_DISTANCE;

        let candidate_keys = match population {
            NamePopulation::Artists => self.reference.find_artist_keys_by_length(min_len, max_len),
            NamePopulation::Recordings => {
                self.reference.find_recording_keys_by_length(min_len, max_len)
            }
        }?;

        let mut best: Option<(usize, &str)> = None;
        for candidate in &candidate_keys {
            let distance = levenshtein(key, candidate);
            if distance == 0 || distance > FUZZY_MAX_DISTANCE {
                continue;
            }
            // Candidate keys arrive sorted, so on equal distance the
            // lexically first key wins and the result stays deterministic.
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, candidate));
            }
        }

        let Some((distance, matched_key)) = best else {
            return Ok(None);
        };
        debug!(
            "Fuzzy-resolved {:?} to key {:?} at distance {}",
            key, matched_key, distance
        );
        self.exact_lookup(matched_key, population, FUZZY_NAME_CONFIDENCE)
            .map(|resolved| {
                resolved.map(|mut identity| {
                    identity.method = ResolutionMethod::FuzzyName;
                    identity
                })
            })
    }
}

/// Deterministic collision tie-break: popularity descending (enriched rows
/// beat unenriched), then mbid ascending.
fn best_artist(mut candidates: Vec<CanonicalArtist>) -> Option<CanonicalArtist> {
    candidates.sort_by(|a, b| {
        b.popularity
            .unwrap_or(0)
            .cmp(&a.popularity.unwrap_or(0))
            .then_with(|| a.mbid.cmp(&b.mbid))
    });
    candidates.into_iter().next()
}

/// Recordings carry no popularity; mbid order alone keeps ties stable.
fn best_recording(mut candidates: Vec<CanonicalRecording>) -> Option<CanonicalRecording> {
    candidates.sort_by(|a, b| a.mbid.cmp(&b.mbid));
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_store::MemoryReferenceStore;

    fn artist(mbid: &str, name: &str, popularity: Option<u8>) -> CanonicalArtist {
        CanonicalArtist {
            mbid: mbid.to_string(),
            name: name.to_string(),
            disambiguation: None,
            spotify_id: None,
            popularity,
            genres: vec![],
        }
    }

    fn recording(mbid: &str, title: &str, isrc: Option<&str>) -> CanonicalRecording {
        CanonicalRecording {
            mbid: mbid.to_string(),
            title: title.to_string(),
            artist_mbid: "artist-1".to_string(),
            duration_ms: None,
            isrc: isrc.map(|s| s.to_string()),
            spotify_id: None,
            tempo: None,
            mode: None,
            energy: None,
            valence: None,
        }
    }

    fn resolver_with(store: MemoryReferenceStore) -> IdentityResolver {
        IdentityResolver::new(Arc::new(store))
    }

    #[test]
    fn test_resolve_by_code_confidence() {
        let store = MemoryReferenceStore::new();
        store.add_recording(recording("rec-1", "Bohemian Rhapsody", Some("GBUM71029604")));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_code("GBUM71029604")
            .unwrap()
            .expect("code should resolve");
        assert_eq!(identity.mbid, "rec-1");
        assert_eq!(identity.confidence, CODE_CONFIDENCE);
        assert_eq!(identity.method, ResolutionMethod::Code);
    }

    #[test]
    fn test_resolve_by_code_miss_is_none_not_error() {
        let resolver = resolver_with(MemoryReferenceStore::new());
        assert!(resolver.resolve_by_code("USRC17607839").unwrap().is_none());
    }

    #[test]
    fn test_resolve_by_name_exact_confidence() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-queen", "Queen", Some(89)));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("  QUEEN ", NamePopulation::Artists)
            .unwrap()
            .expect("name should resolve");
        assert_eq!(identity.mbid, "a-queen");
        assert_eq!(identity.confidence, EXACT_NAME_CONFIDENCE);
        assert_eq!(identity.method, ResolutionMethod::ExactName);
    }

    #[test]
    fn test_name_collision_prefers_popularity_then_mbid() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-2", "America", Some(40)));
        store.add_artist(artist("a-1", "America", Some(70)));
        store.add_artist(artist("a-0", "America", None));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("America", NamePopulation::Artists)
            .unwrap()
            .unwrap();
        assert_eq!(identity.mbid, "a-1");
    }

    #[test]
    fn test_name_collision_mbid_breaks_exact_popularity_tie() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-b", "Nirvana", Some(50)));
        store.add_artist(artist("a-a", "Nirvana", Some(50)));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("Nirvana", NamePopulation::Artists)
            .unwrap()
            .unwrap();
        assert_eq!(identity.mbid, "a-a");
    }

    #[test]
    fn test_alias_pass_matches_ampersand_variant() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-gnr", "Guns N' Roses", Some(85)));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("Guns and Roses", NamePopulation::Artists)
            .unwrap()
            .expect("alias key should resolve");
        assert_eq!(identity.mbid, "a-gnr");
        assert_eq!(identity.confidence, EXACT_NAME_CONFIDENCE);
    }

    #[test]
    fn test_fuzzy_tier_confidence_strictly_below_exact() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-metallica", "Metallica", Some(88)));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("Metalica", NamePopulation::Artists)
            .unwrap()
            .expect("fuzzy tier should resolve a one-edit typo");
        assert_eq!(identity.mbid, "a-metallica");
        assert_eq!(identity.method, ResolutionMethod::FuzzyName);
        assert_eq!(identity.confidence, FUZZY_NAME_CONFIDENCE);
        assert!(identity.confidence < EXACT_NAME_CONFIDENCE);
    }

    #[test]
    fn test_fuzzy_tier_rejects_distant_names() {
        let store = MemoryReferenceStore::new();
        store.add_artist(artist("a-metallica", "Metallica", Some(88)));
        let resolver = resolver_with(store);

        assert!(resolver
            .resolve_by_name("Megadeth", NamePopulation::Artists)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_recording_population_uses_title_normalization() {
        let store = MemoryReferenceStore::new();
        store.add_recording(recording("rec-2", "Africa", None));
        let resolver = resolver_with(store);

        let identity = resolver
            .resolve_by_name("Africa (Karaoke Version)", NamePopulation::Recordings)
            .unwrap()
            .expect("variant-decorated title should resolve");
        assert_eq!(identity.mbid, "rec-2");
    }

    #[test]
    fn test_resolve_spotify_id() {
        let store = MemoryReferenceStore::new();
        let mut abba = artist("a-abba", "ABBA", Some(82));
        abba.spotify_id = Some("0LcJLqbBmaGUft1e9Mm8HV".to_string());
        store.add_artist(abba);
        let resolver = resolver_with(store);

        assert_eq!(
            resolver
                .resolve_spotify_id("0LcJLqbBmaGUft1e9Mm8HV")
                .unwrap()
                .as_deref(),
            Some("a-abba")
        );
        assert!(resolver.resolve_spotify_id("unknown").unwrap().is_none());
    }
}
