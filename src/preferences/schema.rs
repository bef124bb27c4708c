//! SQLite schema for the user preference database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

const PREFERENCE_RECORDS_TABLE: Table = Table {
    name: "preference_records",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_key", &SqlType::Text, non_null = true),
        sqlite_column!("song_title", &SqlType::Text),
        sqlite_column!("source", &SqlType::Text, non_null = true),
        sqlite_column!("rank", &SqlType::Integer),
        sqlite_column!("playcount", &SqlType::Integer),
        sqlite_column!("period", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[
        ("idx_preference_records_user", "user_id"),
        ("idx_preference_records_artist_key", "artist_key"),
    ],
};

const TASTE_PROFILES_TABLE: Table = Table {
    name: "taste_profiles",
    columns: &[
        sqlite_column!("user_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("preferred_decades", &SqlType::Text), // JSON array
        sqlite_column!("target_energy", &SqlType::Real),
    ],
    indices: &[],
};

const EXCLUDED_ARTISTS_TABLE: Table = Table {
    name: "excluded_artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_excluded_artists_user", "user_id")],
};

pub const PREFERENCES_SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    tables: &[
        PREFERENCE_RECORDS_TABLE,
        TASTE_PROFILES_TABLE,
        EXCLUDED_ARTISTS_TABLE,
    ],
};
