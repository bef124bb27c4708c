//! In-memory preference store for tests.

use super::models::{TasteProfile, UserPreferenceRecord};
use super::trait_def::PreferenceStore;
use anyhow::Result;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryPreferenceStore {
    records: RwLock<Vec<UserPreferenceRecord>>,
    profiles: RwLock<Vec<TasteProfile>>,
    excluded: RwLock<Vec<(String, String)>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, record: UserPreferenceRecord) {
        self.records.write().unwrap().push(record);
    }

    pub fn set_profile(&self, profile: TasteProfile) {
        self.profiles.write().unwrap().push(profile);
    }

    pub fn exclude_artist(&self, user_id: &str, artist_name: &str) {
        self.excluded
            .write()
            .unwrap()
            .push((user_id.to_string(), artist_name.to_string()));
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_preference_records(&self, user_id: &str) -> Result<Vec<UserPreferenceRecord>> {
        Ok(self
            .records
            .read()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    fn get_taste_profile(&self, user_id: &str) -> Result<Option<TasteProfile>> {
        Ok(self
            .profiles
            .read()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    fn get_excluded_artists(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .excluded
            .read()
            .unwrap()
            .iter()
            .filter(|(user, _)| user == user_id)
            .map(|(_, artist)| artist.clone())
            .collect())
    }
}
