//! PreferenceStore trait definition.
//!
//! Read access to the per-user preference state. The write path (connector
//! syncs, quiz submissions) lives with the API layer; the core only reads.

use super::models::{TasteProfile, UserPreferenceRecord};
use anyhow::Result;

pub trait PreferenceStore: Send + Sync {
    /// All preference records for a user, every source included.
    /// No ordering is guaranteed; callers must not assume one.
    fn get_preference_records(&self, user_id: &str) -> Result<Vec<UserPreferenceRecord>>;

    /// The user's quiz-derived taste profile, if the quiz was completed.
    fn get_taste_profile(&self, user_id: &str) -> Result<Option<TasteProfile>>;

    /// Artist names the user marked as never-recommend.
    fn get_excluded_artists(&self, user_id: &str) -> Result<Vec<String>>;
}
