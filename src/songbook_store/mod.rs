mod linker;
mod memory;
mod models;
mod schema;
mod store;
mod trait_def;

pub use linker::{LinkMode, LinkReport, SongbookLinker};
pub use memory::MemorySongbookStore;
pub use models::{CatalogLink, DataIntegrityViolation, LinkMethod, SongbookEntry};
pub use schema::SONGBOOK_SCHEMA;
pub use store::SqliteSongbookStore;
pub use trait_def::{SongbookLinkStore, SongbookStore};
