//! Taste population backends.
//!
//! A population answers one query: which of its members share at least one
//! artist with a probe set. Two independent populations back the
//! collaborative engine: our own user base (preference database) and the
//! scrobble service's neighbourhood endpoint. Either can be down; the
//! engine degrades to whichever answered.

use crate::normalize::alias_key;
use crate::preferences::SqlitePreferenceStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One member of a population, with every artist they are known to like.
/// The member ref is opaque; it's reported as supporting evidence and
/// never dereferenced by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationMember {
    pub member_ref: String,
    /// (display name, normalized key) per artist.
    pub artists: Vec<(String, String)>,
}

#[async_trait]
pub trait TastePopulation: Send + Sync {
    /// Population name for logs and supporter refs.
    fn name(&self) -> &'static str;

    /// Members sharing at least one probe artist, at most `cap` of them.
    /// The probe set is capped by the caller (protocol limit); the
    /// returned members' artist sets are always complete.
    async fn find_members_sharing(
        &self,
        probe_keys: &[String],
        exclude_user_id: &str,
        cap: usize,
    ) -> Result<Vec<PopulationMember>>;
}

/// Our own user base, queried straight from the preference database.
pub struct KaraokeUserPopulation {
    store: Arc<SqlitePreferenceStore>,
}

impl KaraokeUserPopulation {
    pub fn new(store: Arc<SqlitePreferenceStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TastePopulation for KaraokeUserPopulation {
    fn name(&self) -> &'static str {
        "karaoke_users"
    }

    async fn find_members_sharing(
        &self,
        probe_keys: &[String],
        exclude_user_id: &str,
        cap: usize,
    ) -> Result<Vec<PopulationMember>> {
        let members = self
            .store
            .find_users_sharing_artists(probe_keys, exclude_user_id, cap)?;
        Ok(members
            .into_iter()
            .map(|(user_id, artists)| PopulationMember {
                member_ref: format!("member:{user_id}"),
                artists,
            })
            .collect())
    }
}

#[derive(Serialize)]
struct NeighbourQuery<'a> {
    artists: &'a [String],
    limit: usize,
}

#[derive(Deserialize)]
struct NeighbourResponse {
    #[serde(default)]
    neighbours: Vec<Neighbour>,
}

#[derive(Deserialize)]
struct Neighbour {
    name: String,
    #[serde(default)]
    artists: Vec<String>,
}

/// HTTP client for the scrobble service's neighbourhood endpoint.
pub struct ScrobbleNeighbourPopulation {
    client: reqwest::Client,
    base_url: String,
}

impl ScrobbleNeighbourPopulation {
    /// # Arguments
    /// * `base_url` - Base URL of the neighbourhood service
    /// * `timeout_sec` - Request timeout in seconds
    pub fn new(base_url: String, timeout_sec: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()
            .context("Failed to create HTTP client")?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl TastePopulation for ScrobbleNeighbourPopulation {
    fn name(&self) -> &'static str {
        "scrobble_neighbours"
    }

    async fn find_members_sharing(
        &self,
        probe_keys: &[String],
        _exclude_user_id: &str,
        cap: usize,
    ) -> Result<Vec<PopulationMember>> {
        let url = format!("{}/neighbours/by-artists", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&NeighbourQuery {
                artists: probe_keys,
                limit: cap,
            })
            .send()
            .await
            .context("Failed to reach neighbourhood service")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Neighbourhood query failed with status {}",
                response.status()
            );
        }

        let body: NeighbourResponse = response
            .json()
            .await
            .context("Failed to parse neighbourhood response")?;

        Ok(body
            .neighbours
            .into_iter()
            .map(|n| PopulationMember {
                member_ref: format!("neighbour:{}", n.name),
                artists: n
                    .artists
                    .into_iter()
                    .map(|name| {
                        let key = alias_key(&name);
                        (name, key)
                    })
                    .collect(),
            })
            .collect())
    }
}

/// Fixed-membership population for tests: intersects the probe set in
/// memory, optionally failing every query to exercise degradation paths.
pub struct StaticPopulation {
    population_name: &'static str,
    members: Vec<PopulationMember>,
    fail: bool,
}

impl StaticPopulation {
    pub fn new(population_name: &'static str, members: Vec<PopulationMember>) -> Self {
        Self {
            population_name,
            members,
            fail: false,
        }
    }

    pub fn failing(population_name: &'static str) -> Self {
        Self {
            population_name,
            members: vec![],
            fail: true,
        }
    }
}

#[async_trait]
impl TastePopulation for StaticPopulation {
    fn name(&self) -> &'static str {
        self.population_name
    }

    async fn find_members_sharing(
        &self,
        probe_keys: &[String],
        _exclude_user_id: &str,
        cap: usize,
    ) -> Result<Vec<PopulationMember>> {
        if self.fail {
            anyhow::bail!("population {} is unavailable", self.population_name);
        }
        let mut members: Vec<PopulationMember> = self
            .members
            .iter()
            .filter(|member| {
                member
                    .artists
                    .iter()
                    .any(|(_, key)| probe_keys.contains(key))
            })
            .cloned()
            .collect();
        members.sort_by(|a, b| a.member_ref.cmp(&b.member_ref));
        members.truncate(cap);
        Ok(members)
    }
}
