//! Identity resolution against a SQLite-backed reference store.

mod common;

use canta::identity::{
    IdentityResolver, NamePopulation, ResolutionMethod, CODE_CONFIDENCE, EXACT_NAME_CONFIDENCE,
};
use common::fixtures::create_test_reference;
use std::sync::Arc;
use tempfile::TempDir;

fn resolver() -> (TempDir, IdentityResolver) {
    let dir = TempDir::new().unwrap();
    let (store, _) = create_test_reference(&dir).unwrap();
    (dir, IdentityResolver::new(Arc::new(store)))
}

#[test]
fn test_code_resolution_has_code_confidence() {
    let (_dir, resolver) = resolver();

    let identity = resolver
        .resolve_by_code("GBUM71029604")
        .unwrap()
        .expect("known isrc should resolve");
    assert_eq!(identity.mbid, "mb-rec-bohemian");
    assert_eq!(identity.confidence, CODE_CONFIDENCE);
    assert_eq!(identity.method, ResolutionMethod::Code);
}

#[test]
fn test_unknown_code_is_not_found_not_error() {
    let (_dir, resolver) = resolver();
    assert!(resolver.resolve_by_code("USRC17607839").unwrap().is_none());
}

#[test]
fn test_exact_name_resolution_has_name_confidence() {
    let (_dir, resolver) = resolver();

    let identity = resolver
        .resolve_by_name("queen", NamePopulation::Artists)
        .unwrap()
        .expect("known artist should resolve");
    assert_eq!(identity.mbid, "mb-queen");
    assert_eq!(identity.confidence, EXACT_NAME_CONFIDENCE);
    assert_eq!(identity.method, ResolutionMethod::ExactName);
    assert_eq!(identity.spotify_id.as_deref(), Some("sp-queen"));
    assert_eq!(identity.popularity, Some(89));
}

#[test]
fn test_name_resolution_applies_normalization() {
    let (_dir, resolver) = resolver();

    // Case, whitespace and a leading article all fold away.
    let identity = resolver
        .resolve_by_name("  The QUEEN ", NamePopulation::Artists)
        .unwrap();
    assert_eq!(identity.unwrap().mbid, "mb-queen");
}

#[test]
fn test_recording_name_resolution() {
    let (_dir, resolver) = resolver();

    let identity = resolver
        .resolve_by_name("Africa (Live)", NamePopulation::Recordings)
        .unwrap()
        .expect("variant title should resolve to the recording");
    assert_eq!(identity.mbid, "mb-rec-africa");
}

#[test]
fn test_fuzzy_resolution_stays_below_exact_tier() {
    let (_dir, resolver) = resolver();

    let identity = resolver
        .resolve_by_name("Quene", NamePopulation::Artists)
        .unwrap()
        .expect("two-edit typo should fuzzy-resolve");
    assert_eq!(identity.mbid, "mb-queen");
    assert_eq!(identity.method, ResolutionMethod::FuzzyName);
    assert!(identity.confidence < EXACT_NAME_CONFIDENCE);
}

#[test]
fn test_spotify_id_mapping() {
    let (_dir, resolver) = resolver();

    assert_eq!(
        resolver.resolve_spotify_id("sp-abba").unwrap().as_deref(),
        Some("mb-abba")
    );
    assert!(resolver.resolve_spotify_id("sp-nobody").unwrap().is_none());
}
