//! Preference aggregation: one merged, source-attributed entry per artist.
//!
//! The merge is strictly additive. When a second source reports an artist
//! we already hold, its source tag joins the set and its numeric fields
//! fill gaps; an existing value is never overwritten by another source.
//! Collapsing to "the record with the highest playcount" is exactly the
//! failure mode this module exists to prevent: it silently discards the
//! other source's rank and enrichment.

use super::models::{ArtistKey, MergedArtistPreference, UserPreferenceRecord};
use super::trait_def::PreferenceStore;
use crate::identity::{IdentityResolver, NamePopulation, ResolvedIdentity};
use crate::normalize::alias_key;
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PreferenceAggregator {
    preferences: Arc<dyn PreferenceStore>,
    resolver: IdentityResolver,
}

impl PreferenceAggregator {
    pub fn new(preferences: Arc<dyn PreferenceStore>, resolver: IdentityResolver) -> Self {
        Self {
            preferences,
            resolver,
        }
    }

    /// Merge all of a user's preference records into one entry per artist
    /// merge key. Unresolvable names keep their data under the raw
    /// normalized name; excluded artists are kept and tagged, not dropped.
    pub fn aggregate(&self, user_id: &str) -> Result<BTreeMap<ArtistKey, MergedArtistPreference>> {
        let records = self.preferences.get_preference_records(user_id)?;
        let mut merged: BTreeMap<ArtistKey, MergedArtistPreference> = BTreeMap::new();

        for record in records {
            let name_key = alias_key(&record.artist_name);
            if name_key.is_empty() {
                debug!("Skipping preference record with blank artist name");
                continue;
            }

            let resolution = self.resolve_artist(&record.artist_name);
            let key = match &resolution {
                Some(identity) => ArtistKey::canonical(identity.mbid.clone()),
                None => ArtistKey::name(name_key.clone()),
            };

            let entry = merged
                .entry(key.clone())
                .or_insert_with(|| new_merged(key, &record, &name_key, resolution.as_ref()));
            merge_record(entry, &record, resolution.as_ref());
        }

        self.apply_exclusions(user_id, &mut merged)?;
        Ok(merged)
    }

    /// Resolution errors are absorbed here: a broken reference store must
    /// not lose the user's preference data, it only loses the enrichment.
    fn resolve_artist(&self, artist_name: &str) -> Option<ResolvedIdentity> {
        match self.resolver.resolve_by_name(artist_name, NamePopulation::Artists) {
            Ok(resolution) => resolution,
            Err(e) => {
                warn!("Artist resolution failed for {:?}: {}", artist_name, e);
                None
            }
        }
    }

    fn apply_exclusions(
        &self,
        user_id: &str,
        merged: &mut BTreeMap<ArtistKey, MergedArtistPreference>,
    ) -> Result<()> {
        for artist_name in self.preferences.get_excluded_artists(user_id)? {
            let name_key = alias_key(&artist_name);
            if name_key.is_empty() {
                continue;
            }
            let resolution = self.resolve_artist(&artist_name);
            let key = match &resolution {
                Some(identity) => ArtistKey::canonical(identity.mbid.clone()),
                None => ArtistKey::name(name_key.clone()),
            };

            // The artist stays visible in the merged set either way, so the
            // profile view can show why it won't be recommended.
            merged
                .entry(key.clone())
                .or_insert_with(|| MergedArtistPreference {
                    key,
                    display_name: resolution
                        .as_ref()
                        .map(|r| r.name.clone())
                        .unwrap_or_else(|| artist_name.trim().to_string()),
                    name_key,
                    sources: Default::default(),
                    rank_by_source: Default::default(),
                    playcount_by_source: Default::default(),
                    canonical_mbid: resolution.as_ref().map(|r| r.mbid.clone()),
                    resolution_confidence: resolution.as_ref().map(|r| r.confidence),
                    spotify_id: resolution.as_ref().and_then(|r| r.spotify_id.clone()),
                    popularity: resolution.as_ref().and_then(|r| r.popularity),
                    excluded: false,
                })
                .excluded = true;
        }
        Ok(())
    }
}

fn new_merged(
    key: ArtistKey,
    record: &UserPreferenceRecord,
    name_key: &str,
    resolution: Option<&ResolvedIdentity>,
) -> MergedArtistPreference {
    MergedArtistPreference {
        key,
        display_name: resolution
            .map(|r| r.name.clone())
            .unwrap_or_else(|| record.artist_name.trim().to_string()),
        name_key: name_key.to_string(),
        sources: Default::default(),
        rank_by_source: Default::default(),
        playcount_by_source: Default::default(),
        canonical_mbid: None,
        resolution_confidence: None,
        spotify_id: None,
        popularity: None,
        excluded: false,
    }
}

fn merge_record(
    entry: &mut MergedArtistPreference,
    record: &UserPreferenceRecord,
    resolution: Option<&ResolvedIdentity>,
) {
    entry.sources.insert(record.source);

    // Per-source bests: the lowest rank and the highest playcount a source
    // ever reported (a source can report several periods).
    if let Some(rank) = record.rank {
        entry
            .rank_by_source
            .entry(record.source)
            .and_modify(|existing| *existing = (*existing).min(rank))
            .or_insert(rank);
    }
    if let Some(playcount) = record.playcount {
        entry
            .playcount_by_source
            .entry(record.source)
            .and_modify(|existing| *existing = (*existing).max(playcount))
            .or_insert(playcount);
    }

    // Enrichment fills gaps only.
    if let Some(resolution) = resolution {
        if entry.canonical_mbid.is_none() {
            entry.canonical_mbid = Some(resolution.mbid.clone());
            entry.resolution_confidence = Some(resolution.confidence);
        }
        if entry.spotify_id.is_none() {
            entry.spotify_id = resolution.spotify_id.clone();
        }
        if entry.popularity.is_none() {
            entry.popularity = resolution.popularity;
        }
    }
}
