//! In-memory songbook store for tests and local development.

use super::models::{CatalogLink, LinkMethod, SongbookEntry};
use super::trait_def::{SongbookLinkStore, SongbookStore};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemorySongbookStore {
    entries: RwLock<Vec<SongbookEntry>>,
    links: RwLock<HashMap<String, CatalogLink>>,
}

impl MemorySongbookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&self, entry: SongbookEntry) {
        self.entries.write().unwrap().push(entry);
    }
}

impl SongbookStore for MemorySongbookStore {
    fn get_entry(&self, id: &str) -> Result<Option<SongbookEntry>> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    fn get_entries_by_artist_key(&self, artist_key: &str) -> Result<Vec<SongbookEntry>> {
        let mut entries: Vec<SongbookEntry> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.artist_key == artist_key)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.popularity.cmp(&a.popularity).then_with(|| a.id.cmp(&b.id)));
        Ok(entries)
    }

    fn get_crowd_pleasers(&self, min_coverage: u32, limit: usize) -> Result<Vec<SongbookEntry>> {
        let mut entries: Vec<SongbookEntry> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.coverage_breadth >= min_coverage && e.has_singable_version)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.coverage_breadth
                .cmp(&a.coverage_breadth)
                .then_with(|| b.popularity.cmp(&a.popularity))
                .then_with(|| a.id.cmp(&b.id))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    fn get_link(&self, entry_id: &str) -> Result<Option<CatalogLink>> {
        Ok(self.links.read().unwrap().get(entry_id).cloned())
    }
}

impl SongbookLinkStore for MemorySongbookStore {
    fn list_entries_needing_link(&self, limit: usize) -> Result<Vec<SongbookEntry>> {
        let links = self.links.read().unwrap();
        let mut entries: Vec<SongbookEntry> = self
            .entries
            .read()
            .unwrap()
            .iter()
            .filter(|e| {
                links
                    .get(&e.id)
                    .map_or(true, |link| link.method != LinkMethod::Code)
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries.truncate(limit);
        Ok(entries)
    }

    fn upsert_link(&self, link: &CatalogLink) -> Result<()> {
        self.links
            .write()
            .unwrap()
            .insert(link.entry_id.clone(), link.clone());
        Ok(())
    }
}
