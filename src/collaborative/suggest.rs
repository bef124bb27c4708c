//! Collaborative artist suggestions from shared-taste cohorts.
//!
//! Both populations are queried concurrently, each behind its own timeout.
//! A timed-out or failed population is logged and dropped; the other's
//! members still produce suggestions. Discovery uses a capped probe set
//! (the population query protocol bounds how many artists one call can
//! match), but the shared-taste gate always counts against the caller's
//! full known set.

use super::populations::{PopulationMember, TastePopulation};
use crate::preferences::MergedArtistPreference;
use futures::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning for the cohort query and gate.
#[derive(Debug, Clone)]
pub struct SuggestionSettings {
    /// Minimum artists a member must share with the caller. Below this the
    /// overlap is too thin to call it shared taste.
    pub min_shared: usize,
    /// Probe set cap; the population query protocol limits how many
    /// artist values one call may match.
    pub probe_cap: usize,
    /// Maximum members taken per population.
    pub member_cap: usize,
    /// Per-population query timeout.
    pub timeout: Duration,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            min_shared: 3,
            probe_cap: 30,
            member_cap: 50,
            timeout: Duration::from_secs(10),
        }
    }
}

/// A known artist as fed into the cohort probe.
#[derive(Debug, Clone)]
pub struct KnownArtist {
    pub name_key: String,
    pub rank: Option<u32>,
    pub playcount: Option<u64>,
}

impl From<&MergedArtistPreference> for KnownArtist {
    fn from(pref: &MergedArtistPreference) -> Self {
        Self {
            name_key: pref.name_key.clone(),
            rank: pref.best_rank(),
            playcount: pref.best_playcount(),
        }
    }
}

/// One suggested artist with the members who support it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistSuggestion {
    pub display_name: String,
    pub supporters: Vec<String>,
}

pub struct CollaborativeSuggester {
    populations: Vec<Arc<dyn TastePopulation>>,
    settings: SuggestionSettings,
}

impl CollaborativeSuggester {
    pub fn new(populations: Vec<Arc<dyn TastePopulation>>, settings: SuggestionSettings) -> Self {
        Self {
            populations,
            settings,
        }
    }

    /// Suggest artists the user doesn't know yet, keyed by normalized
    /// artist name. Empty when the caller knows fewer than `min_shared`
    /// artists; unordered (ordering is the scoring engine's job) but
    /// deterministic for identical population snapshots.
    pub async fn suggest(
        &self,
        user_id: &str,
        known: &[KnownArtist],
    ) -> BTreeMap<String, ArtistSuggestion> {
        if known.len() < self.settings.min_shared {
            debug!(
                "Skipping collaborative suggestions: {} known artists < min_shared {}",
                known.len(),
                self.settings.min_shared
            );
            return BTreeMap::new();
        }

        let probe = self.build_probe(known);
        let known_keys: HashSet<&str> = known.iter().map(|k| k.name_key.as_str()).collect();

        // All population queries in flight at once; sequential querying
        // would stack their latencies for no benefit.
        let queries = self.populations.iter().map(|population| {
            let probe = probe.clone();
            let population = Arc::clone(population);
            async move {
                let outcome = tokio::time::timeout(
                    self.settings.timeout,
                    population.find_members_sharing(&probe, user_id, self.settings.member_cap),
                )
                .await;
                (population.name(), outcome)
            }
        });

        let mut members: Vec<PopulationMember> = Vec::new();
        for (population_name, outcome) in join_all(queries).await {
            match outcome {
                Ok(Ok(found)) => {
                    debug!(
                        "Population {} returned {} candidate members",
                        population_name,
                        found.len()
                    );
                    members.extend(found);
                }
                Ok(Err(e)) => {
                    warn!(
                        "Population {} query failed, continuing without it: {}",
                        population_name, e
                    );
                }
                Err(_) => {
                    warn!(
                        "Population {} query timed out after {:?}, continuing without it",
                        population_name, self.settings.timeout
                    );
                }
            }
        }

        // Member order must not leak into the output; sort before folding.
        members.sort_by(|a, b| a.member_ref.cmp(&b.member_ref));

        let mut suggestions: BTreeMap<String, ArtistSuggestion> = BTreeMap::new();
        for member in &members {
            // The gate counts shared artists against the FULL known set.
            // The probe cap above only bounds candidate discovery.
            let shared = member
                .artists
                .iter()
                .filter(|(_, key)| known_keys.contains(key.as_str()))
                .count();
            if shared < self.settings.min_shared {
                continue;
            }

            for (name, key) in &member.artists {
                if known_keys.contains(key.as_str()) || key.is_empty() {
                    continue;
                }
                let suggestion =
                    suggestions
                        .entry(key.clone())
                        .or_insert_with(|| ArtistSuggestion {
                            display_name: name.clone(),
                            supporters: Vec::new(),
                        });
                if !suggestion.supporters.contains(&member.member_ref) {
                    suggestion.supporters.push(member.member_ref.clone());
                }
            }
        }

        info!(
            "Collaborative suggestions: {} candidate artists from {} members",
            suggestions.len(),
            members.len()
        );
        suggestions
    }

    /// Probe set: the strongest `probe_cap` known artists. Best rank
    /// first, then playcount, then key order; fully deterministic.
    fn build_probe(&self, known: &[KnownArtist]) -> Vec<String> {
        let mut sorted: Vec<&KnownArtist> = known.iter().collect();
        sorted.sort_by(|a, b| {
            match (a.rank, b.rank) {
                (Some(ra), Some(rb)) => ra.cmp(&rb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
            .then_with(|| b.playcount.unwrap_or(0).cmp(&a.playcount.unwrap_or(0)))
            .then_with(|| a.name_key.cmp(&b.name_key))
        });

        let mut probe: Vec<String> = Vec::with_capacity(self.settings.probe_cap);
        for artist in sorted {
            if probe.len() >= self.settings.probe_cap {
                break;
            }
            if !probe.contains(&artist.name_key) {
                probe.push(artist.name_key.clone());
            }
        }
        probe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborative::populations::StaticPopulation;

    fn known(keys: &[&str]) -> Vec<KnownArtist> {
        keys.iter()
            .enumerate()
            .map(|(i, key)| KnownArtist {
                name_key: key.to_string(),
                rank: Some(i as u32 + 1),
                playcount: None,
            })
            .collect()
    }

    fn member(member_ref: &str, artists: &[&str]) -> PopulationMember {
        PopulationMember {
            member_ref: member_ref.to_string(),
            artists: artists
                .iter()
                .map(|a| (a.to_string(), a.to_string()))
                .collect(),
        }
    }

    fn suggester(populations: Vec<Arc<dyn TastePopulation>>) -> CollaborativeSuggester {
        CollaborativeSuggester::new(populations, SuggestionSettings::default())
    }

    #[tokio::test]
    async fn test_too_few_known_artists_returns_empty() {
        let population = Arc::new(StaticPopulation::new(
            "a",
            vec![member("m1", &["queen", "abba", "toto", "journey"])],
        ));
        let suggester = suggester(vec![population]);

        let result = suggester.suggest("u1", &known(&["queen", "abba"])).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_members_below_min_shared_are_discarded() {
        let population = Arc::new(StaticPopulation::new(
            "a",
            vec![
                member("m-close", &["queen", "abba", "toto", "journey"]),
                member("m-thin", &["queen", "daft punk", "air"]),
            ],
        ));
        let suggester = suggester(vec![population]);

        let result = suggester
            .suggest("u1", &known(&["queen", "abba", "toto"]))
            .await;

        // m-close shares 3 and contributes "journey"; m-thin shares only 1.
        assert_eq!(result.len(), 1);
        let suggestion = result.get("journey").expect("journey suggested");
        assert_eq!(suggestion.supporters, vec!["m-close".to_string()]);
        assert!(!result.contains_key("daft punk"));
    }

    #[tokio::test]
    async fn test_failed_population_degrades_to_survivor() {
        let healthy = vec![
            member("m1", &["queen", "abba", "toto", "europe"]),
            member("m2", &["queen", "abba", "toto", "asia"]),
        ];
        let with_both: CollaborativeSuggester = suggester(vec![
            Arc::new(StaticPopulation::new("healthy", healthy.clone())),
            Arc::new(StaticPopulation::failing("broken")),
        ]);
        let with_survivor_only: CollaborativeSuggester =
            suggester(vec![Arc::new(StaticPopulation::new("healthy", healthy))]);

        let knowns = known(&["queen", "abba", "toto"]);
        let degraded = with_both.suggest("u1", &knowns).await;
        let baseline = with_survivor_only.suggest("u1", &knowns).await;

        assert_eq!(degraded, baseline);
        assert!(degraded.contains_key("europe"));
        assert!(degraded.contains_key("asia"));
    }

    #[tokio::test]
    async fn test_all_populations_failing_returns_empty_not_error() {
        let suggester = suggester(vec![
            Arc::new(StaticPopulation::failing("a")),
            Arc::new(StaticPopulation::failing("b")),
        ]);

        let result = suggester
            .suggest("u1", &known(&["queen", "abba", "toto"]))
            .await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_gate_counts_full_known_set_beyond_probe_cap() {
        // 35 known artists; the probe is capped at 30, so k30..k34 never
        // reach the population query. A member matched through one probed
        // artist still gets credit for sharing the unprobed ones.
        let keys: Vec<String> = (0..35).map(|i| format!("k{i:02}")).collect();
        let key_refs: Vec<&str> = keys.iter().map(|s| s.as_str()).collect();

        let population = Arc::new(StaticPopulation::new(
            "a",
            vec![member("m1", &["k00", "k33", "k34", "fresh artist"])],
        ));
        let suggester = suggester(vec![population]);

        let result = suggester.suggest("u1", &known(&key_refs)).await;
        // Shares k00 (probed) + k33 + k34 (unprobed) = 3 >= min_shared.
        assert_eq!(result.len(), 1);
        assert!(result.contains_key("fresh artist"));
    }

    #[tokio::test]
    async fn test_supporters_merge_across_populations() {
        let suggester = suggester(vec![
            Arc::new(StaticPopulation::new(
                "a",
                vec![member("member:1", &["queen", "abba", "toto", "europe"])],
            )),
            Arc::new(StaticPopulation::new(
                "b",
                vec![member("neighbour:x", &["queen", "abba", "toto", "europe"])],
            )),
        ]);

        let result = suggester
            .suggest("u1", &known(&["queen", "abba", "toto"]))
            .await;
        let suggestion = result.get("europe").unwrap();
        assert_eq!(
            suggestion.supporters,
            vec!["member:1".to_string(), "neighbour:x".to_string()]
        );
    }
}
