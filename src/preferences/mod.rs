mod aggregator;
mod memory;
mod models;
mod schema;
mod store;
mod trait_def;

pub use aggregator::PreferenceAggregator;
pub use memory::MemoryPreferenceStore;
pub use models::{
    ArtistKey, MergedArtistPreference, PreferenceSource, TasteProfile, UserPreferenceRecord,
};
pub use schema::PREFERENCES_SCHEMA;
pub use store::SqlitePreferenceStore;
pub use trait_def::PreferenceStore;
