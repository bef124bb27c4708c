//! End-to-end scoring and categorization over in-memory stores.

mod common;

use canta::collaborative::{
    CollaborativeSuggester, PopulationMember, StaticPopulation, SuggestionSettings,
    TastePopulation,
};
use canta::identity::IdentityResolver;
use canta::preferences::{
    MemoryPreferenceStore, PreferenceAggregator, PreferenceSource, TasteProfile,
};
use canta::recommend::{
    CategoryId, ReasonCode, RecommendationEngine, RecommendationFilters, RecommendationSettings,
};
use canta::reference_store::MemoryReferenceStore;
use canta::songbook_store::{
    CatalogLink, LinkMethod, MemorySongbookStore, SongbookEntry, SongbookLinkStore,
};
use common::fixtures::{preference, recording};
use std::sync::Arc;

fn entry(id: &str, title: &str, artist: &str, artist_key: &str) -> SongbookEntry {
    SongbookEntry {
        id: id.to_string(),
        title: title.to_string(),
        artist_name: artist.to_string(),
        artist_key: artist_key.to_string(),
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

struct Harness {
    preferences: Arc<MemoryPreferenceStore>,
    reference: Arc<MemoryReferenceStore>,
    songbook: Arc<MemorySongbookStore>,
    populations: Vec<Arc<dyn TastePopulation>>,
    settings: RecommendationSettings,
}

impl Harness {
    fn new() -> Self {
        Self {
            preferences: Arc::new(MemoryPreferenceStore::new()),
            reference: Arc::new(MemoryReferenceStore::new()),
            songbook: Arc::new(MemorySongbookStore::new()),
            populations: vec![],
            settings: RecommendationSettings::default(),
        }
    }

    fn engine(self) -> RecommendationEngine {
        let resolver = IdentityResolver::new(self.reference.clone());
        let aggregator = PreferenceAggregator::new(self.preferences.clone(), resolver);
        let suggester =
            CollaborativeSuggester::new(self.populations, SuggestionSettings::default());
        RecommendationEngine::new(
            aggregator,
            suggester,
            self.songbook,
            self.reference,
            self.preferences,
            self.settings,
        )
    }
}

fn crowd_entries() -> Vec<SongbookEntry> {
    let mut caroline = entry("sb-caroline", "Sweet Caroline", "Neil Diamond", "neil diamond");
    caroline.coverage_breadth = 20;
    caroline.popularity = 80;
    let mut wonderwall = entry("sb-wonderwall", "Wonderwall", "Oasis", "oasis");
    wonderwall.coverage_breadth = 15;
    wonderwall.popularity = 78;
    vec![caroline, wonderwall]
}

#[tokio::test]
async fn test_empty_user_still_gets_crowd_pleasers() {
    let harness = Harness::new();
    for e in crowd_entries() {
        harness.songbook.add_entry(e);
    }
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("nobody", &RecommendationFilters::default())
        .await
        .unwrap();

    let crowd = result.bucket(CategoryId::CrowdPleasers).unwrap();
    assert!(!crowd.candidates.is_empty());
    assert!(result
        .bucket(CategoryId::FromArtistsYouKnow)
        .unwrap()
        .candidates
        .is_empty());
    assert!(result
        .bucket(CategoryId::NewDiscoveries)
        .unwrap()
        .candidates
        .is_empty());
}

#[tokio::test]
async fn test_known_artist_songs_lead_with_known_reason() {
    let harness = Harness::new();
    harness.songbook.add_entry(entry("sb-1", "Bohemian Rhapsody", "Queen", "queen"));
    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let known = result.bucket(CategoryId::FromArtistsYouKnow).unwrap();
    assert_eq!(known.candidates.len(), 1);
    let candidate = &known.candidates[0];
    assert_eq!(candidate.entry_id.as_deref(), Some("sb-1"));
    assert_eq!(candidate.reason, ReasonCode::KnownArtist);
    assert!(candidate.reason_text.contains("Queen"));
}

#[tokio::test]
async fn test_known_candidate_not_duplicated_into_crowd_bucket() {
    let harness = Harness::new();
    let mut bohemian = entry("sb-1", "Bohemian Rhapsody", "Queen", "queen");
    bohemian.coverage_breadth = 18;
    harness.songbook.add_entry(bohemian);
    for e in crowd_entries() {
        harness.songbook.add_entry(e);
    }
    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let crowd = result.bucket(CategoryId::CrowdPleasers).unwrap();
    assert!(crowd
        .candidates
        .iter()
        .all(|c| c.entry_id.as_deref() != Some("sb-1")));
}

#[tokio::test]
async fn test_per_artist_cap_guarantees_diversity() {
    let mut harness = Harness::new();
    harness.settings.per_artist_cap = 2;
    for i in 0..5 {
        let mut e = entry(
            &format!("sb-q{i}"),
            &format!("Queen Song {i}"),
            "Queen",
            "queen",
        );
        e.popularity = 90 - i as u8;
        harness.songbook.add_entry(e);
    }
    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let known = result.bucket(CategoryId::FromArtistsYouKnow).unwrap();
    assert_eq!(known.candidates.len(), 2);
    // The strongest two survive.
    assert_eq!(known.candidates[0].entry_id.as_deref(), Some("sb-q0"));
    assert_eq!(known.candidates[1].entry_id.as_deref(), Some("sb-q1"));
}

#[tokio::test]
async fn test_scores_stay_clamped_under_adversarial_signals() {
    let mut harness = Harness::new();
    // Inflated weights on top of maxed signals push the raw sum well past
    // 1; the clamp has to hold anyway.
    harness.settings.weights.known_artist = 0.9;
    harness.settings.weights.popularity = 0.6;
    let mut e = entry("sb-max", "Monster Hit", "Queen", "queen");
    e.popularity = 100;
    e.coverage_breadth = 1_000_000;
    e.decade = Some(1970);
    harness.songbook.add_entry(e);
    harness
        .songbook
        .upsert_link(
            &CatalogLink::new(
                "sb-max".to_string(),
                LinkMethod::Code,
                Some("mb-rec-max".to_string()),
                None,
            )
            .unwrap(),
        )
        .unwrap();
    let mut rec = recording("mb-rec-max", "Monster Hit", "mb-queen", None);
    rec.energy = Some(0.9);
    harness.reference.add_recording(rec);

    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    harness.preferences.set_profile(TasteProfile {
        user_id: "u1".to_string(),
        preferred_decades: vec![1970],
        target_energy: Some(0.9),
    });
    harness.populations = vec![Arc::new(StaticPopulation::new(
        "cohort",
        vec![PopulationMember {
            member_ref: "m1".to_string(),
            artists: vec![("Queen".to_string(), "queen".to_string())],
        }],
    ))];

    let engine = harness.engine();
    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    for bucket in &result.categories {
        for candidate in &bucket.candidates {
            assert!(
                (0.0..=1.0).contains(&candidate.score),
                "score {} out of range for {:?}",
                candidate.score,
                candidate.entry_id
            );
        }
    }
    let known = result.bucket(CategoryId::FromArtistsYouKnow).unwrap();
    assert_eq!(known.candidates[0].score, 1.0);
}

#[tokio::test]
async fn test_buckets_sorted_by_score_then_popularity() {
    let harness = Harness::new();
    // Same artist so the known signal ties; popularity breaks the tie.
    let mut low = entry("sb-low", "Deep Cut", "Queen", "queen");
    low.popularity = 30;
    let mut high = entry("sb-high", "Big Hit", "Queen", "queen");
    high.popularity = 95;
    harness.songbook.add_entry(low);
    harness.songbook.add_entry(high);
    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let known = result.bucket(CategoryId::FromArtistsYouKnow).unwrap();
    let scores: Vec<f64> = known.candidates.iter().map(|c| c.score).collect();
    let mut sorted = scores.clone();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap());
    assert_eq!(scores, sorted);
    assert_eq!(known.candidates[0].entry_id.as_deref(), Some("sb-high"));
}

#[tokio::test]
async fn test_filters_apply_before_bucket_caps() {
    let mut harness = Harness::new();
    harness.settings.crowd_bucket_cap = 2;
    // Three crowd pleasers; the strongest is explicit.
    let mut explicit_hit = entry("sb-a-explicit", "Filthy Anthem", "Artist A", "artist a");
    explicit_hit.coverage_breadth = 25;
    explicit_hit.popularity = 95;
    explicit_hit.explicit = true;
    harness.songbook.add_entry(explicit_hit);
    for e in crowd_entries() {
        harness.songbook.add_entry(e);
    }
    let engine = harness.engine();

    let filters = RecommendationFilters {
        exclude_explicit: true,
        ..Default::default()
    };
    let result = engine.score_and_categorize("u1", &filters).await.unwrap();

    let crowd = result.bucket(CategoryId::CrowdPleasers).unwrap();
    // The cap is still honoured by matching candidates; the filtered-out
    // song didn't consume a slot.
    assert_eq!(crowd.candidates.len(), 2);
    assert!(crowd
        .candidates
        .iter()
        .all(|c| c.entry_id.as_deref() != Some("sb-a-explicit")));
}

#[tokio::test]
async fn test_excluded_artist_is_never_recommended() {
    let harness = Harness::new();
    harness.songbook.add_entry(entry("sb-1", "Bohemian Rhapsody", "Queen", "queen"));
    for e in crowd_entries() {
        harness.songbook.add_entry(e);
    }
    harness
        .preferences
        .add_record(preference("u1", "Queen", PreferenceSource::SpotifyRanked, Some(1), None));
    harness.preferences.exclude_artist("u1", "Queen");
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    for bucket in &result.categories {
        assert!(
            bucket.candidates.iter().all(|c| c.artist_name != "Queen"),
            "excluded artist leaked into {:?}",
            bucket.id
        );
    }
    // The response itself is still populated.
    assert!(!result
        .bucket(CategoryId::CrowdPleasers)
        .unwrap()
        .candidates
        .is_empty());
}

#[tokio::test]
async fn test_known_artist_without_singable_version_becomes_generate_candidate() {
    let harness = Harness::new();
    harness
        .preferences
        .add_record(preference(
            "u1",
            "Obscure Garage Band",
            PreferenceSource::Manual,
            None,
            None,
        ));
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let create = result.bucket(CategoryId::CreateYourOwn).unwrap();
    assert_eq!(create.candidates.len(), 1);
    let candidate = &create.candidates[0];
    assert_eq!(candidate.reason, ReasonCode::GenerateKaraoke);
    assert_eq!(candidate.artist_name, "Obscure Garage Band");
    assert!(candidate.entry_id.is_none());
    assert!(!candidate.has_singable_version);
}

#[tokio::test]
async fn test_cohort_suggested_artist_lands_in_discoveries() {
    let mut harness = Harness::new();
    let mut journey = entry("sb-journey", "Don't Stop Believin'", "Journey", "journey");
    journey.popularity = 85;
    harness.songbook.add_entry(journey);
    // User's own artists have no songbook presence needed for this test.
    for artist in ["Queen", "ABBA", "Toto"] {
        harness.preferences.add_record(preference(
            "u1",
            artist,
            PreferenceSource::SpotifyRanked,
            Some(1),
            None,
        ));
    }
    harness.populations = vec![Arc::new(StaticPopulation::new(
        "cohort",
        vec![PopulationMember {
            member_ref: "m1".to_string(),
            artists: [("Queen", "queen"), ("ABBA", "abba"), ("Toto", "toto"), ("Journey", "journey")]
                .iter()
                .map(|(n, k)| (n.to_string(), k.to_string()))
                .collect(),
        }],
    ))];
    let engine = harness.engine();

    let result = engine
        .score_and_categorize("u1", &RecommendationFilters::default())
        .await
        .unwrap();

    let discoveries = result.bucket(CategoryId::NewDiscoveries).unwrap();
    assert_eq!(discoveries.candidates.len(), 1);
    assert_eq!(
        discoveries.candidates[0].entry_id.as_deref(),
        Some("sb-journey")
    );
}
