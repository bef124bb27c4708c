//! SongbookStore trait definitions.
//!
//! The scoring engine reads the songbook through `SongbookStore`; the
//! linker additionally needs `SongbookLinkStore` for link maintenance.
//! Split so the request path is provably read-only.

use super::models::{CatalogLink, SongbookEntry};
use anyhow::Result;

pub trait SongbookStore: Send + Sync {
    /// Point lookup by entry id.
    fn get_entry(&self, id: &str) -> Result<Option<SongbookEntry>>;

    /// All entries for one normalized artist key, ordered by popularity
    /// descending then id ascending.
    fn get_entries_by_artist_key(&self, artist_key: &str) -> Result<Vec<SongbookEntry>>;

    /// Entries offered by at least `min_coverage` publishers, the
    /// crowd-pleaser pool. Ordered by coverage descending, popularity
    /// descending, id ascending; at most `limit` rows.
    fn get_crowd_pleasers(&self, min_coverage: u32, limit: usize) -> Result<Vec<SongbookEntry>>;

    /// The stored link for an entry, if any. A stored row that violates the
    /// confidence invariants surfaces as an error here, not as a link.
    fn get_link(&self, entry_id: &str) -> Result<Option<CatalogLink>>;
}

/// Write surface used by the linker pass only.
pub trait SongbookLinkStore: SongbookStore {
    /// Entries with no link yet, or a link that could still be upgraded
    /// (anything below a code match). At most `limit` rows, id order.
    fn list_entries_needing_link(&self, limit: usize) -> Result<Vec<SongbookEntry>>;

    /// Insert or replace the link for an entry.
    fn upsert_link(&self, link: &CatalogLink) -> Result<()>;
}
