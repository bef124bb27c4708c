mod memory;
mod models;
mod schema;
mod store;
mod trait_def;

pub use memory::MemoryReferenceStore;
pub use models::{CanonicalArtist, CanonicalRecording};
pub use schema::REFERENCE_SCHEMA;
pub use store::SqliteReferenceStore;
pub use trait_def::ReferenceStore;
