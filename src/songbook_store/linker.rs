//! Songbook linker pass.
//!
//! Resolves each songbook entry to a canonical recording and stores the
//! resulting `CatalogLink`. Two-phase ladder per entry: the ISRC code
//! first, the exact normalized title second. An existing code link is
//! final; anything weaker can be upgraded by a later run, never downgraded.

use super::models::{CatalogLink, LinkMethod};
use super::trait_def::SongbookLinkStore;
use crate::identity::{IdentityResolver, NamePopulation};
use crate::normalize::{alias_key, normalize_title};
use crate::reference_store::ReferenceStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Execution mode for the link pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Report what would be written without touching the link table.
    #[default]
    DryRun,
    /// Write links.
    Actual,
}

/// Summary of one link pass.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub mode: LinkMode,
    pub processed: usize,
    pub code_matched: usize,
    pub name_matched: usize,
    pub unresolved: usize,
    pub upgraded: usize,
    pub errors: usize,
}

impl LinkReport {
    pub fn resolved(&self) -> usize {
        self.code_matched + self.name_matched
    }
}

pub struct SongbookLinker {
    songbook: Arc<dyn SongbookLinkStore>,
    reference: Arc<dyn ReferenceStore>,
    resolver: IdentityResolver,
}

impl SongbookLinker {
    pub fn new(songbook: Arc<dyn SongbookLinkStore>, reference: Arc<dyn ReferenceStore>) -> Self {
        let resolver = IdentityResolver::new(Arc::clone(&reference));
        Self {
            songbook,
            reference,
            resolver,
        }
    }

    /// Run one pass over entries still missing a code link.
    pub fn run(&self, mode: LinkMode, batch_size: usize) -> Result<LinkReport> {
        let entries = self.songbook.list_entries_needing_link(batch_size)?;
        info!(
            "Link pass over {} entries ({:?} mode)",
            entries.len(),
            mode
        );

        let mut report = LinkReport {
            mode,
            processed: 0,
            code_matched: 0,
            name_matched: 0,
            unresolved: 0,
            upgraded: 0,
            errors: 0,
        };

        for entry in entries {
            report.processed += 1;

            let existing = match self.songbook.get_link(&entry.id) {
                Ok(existing) => existing,
                Err(e) => {
                    warn!("Skipping entry {}: stored link unreadable: {}", entry.id, e);
                    report.errors += 1;
                    continue;
                }
            };

            let link = match self.link_entry(&entry) {
                Ok(link) => link,
                Err(e) => {
                    warn!("Failed to link entry {}: {}", entry.id, e);
                    report.errors += 1;
                    continue;
                }
            };

            match link.method {
                LinkMethod::Code => report.code_matched += 1,
                LinkMethod::ExactName => report.name_matched += 1,
                LinkMethod::Unresolved => report.unresolved += 1,
            }

            // Only move up the ladder. An equal-or-weaker result leaves the
            // stored link alone so repeated runs are stable.
            let should_write = match &existing {
                None => true,
                Some(existing) => link.confidence > existing.confidence,
            };
            if !should_write {
                continue;
            }
            if existing.is_some() {
                report.upgraded += 1;
            }

            if mode == LinkMode::Actual {
                self.songbook.upsert_link(&link)?;
            }
        }

        info!(
            "Link pass complete: {} code, {} name, {} unresolved, {} upgraded, {} errors",
            report.code_matched,
            report.name_matched,
            report.unresolved,
            report.upgraded,
            report.errors
        );
        Ok(report)
    }

    fn link_entry(&self, entry: &super::models::SongbookEntry) -> Result<CatalogLink> {
        // Phase 1: the cross-reference code, when the entry carries one.
        if let Some(isrc) = &entry.isrc {
            if let Some(identity) = self.resolver.resolve_by_code(isrc)? {
                debug!("Entry {} code-matched to {}", entry.id, identity.mbid);
                return Ok(CatalogLink::new(
                    entry.id.clone(),
                    LinkMethod::Code,
                    Some(identity.mbid),
                    identity.spotify_id,
                )?);
            }
        }

        // Phase 2: exact title match, constrained to recordings whose
        // canonical artist matches this entry's artist. Title collisions
        // across artists are the norm ("Hurt", "Crazy"), so an
        // unconstrained title hit would link the wrong master.
        let artist_mbid = self
            .resolver
            .resolve_by_name(&entry.artist_name, NamePopulation::Artists)?
            .map(|identity| identity.mbid);

        if let Some(artist_mbid) = artist_mbid {
            let title_key = alias_key(&normalize_title(&entry.title));
            let mut candidates: Vec<_> = self
                .reference
                .get_recordings_by_normalized_title(&title_key)?
                .into_iter()
                .filter(|r| r.artist_mbid == artist_mbid)
                .collect();
            candidates.sort_by(|a, b| a.mbid.cmp(&b.mbid));

            if let Some(recording) = candidates.into_iter().next() {
                debug!("Entry {} name-matched to {}", entry.id, recording.mbid);
                return Ok(CatalogLink::new(
                    entry.id.clone(),
                    LinkMethod::ExactName,
                    Some(recording.mbid),
                    recording.spotify_id,
                )?);
            }
        } else {
            debug!(
                "Entry {}: artist {:?} (key {:?}) not in reference data",
                entry.id,
                entry.artist_name,
                alias_key(&entry.artist_name)
            );
        }

        // An unresolved placeholder is a valid terminal state; a later pass
        // retries it after the next reference ingestion.
        Ok(CatalogLink::new(
            entry.id.clone(),
            LinkMethod::Unresolved,
            None,
            None,
        )?)
    }
}
