//! SQLite schema for the songbook database.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema, DEFAULT_TIMESTAMP};

const SONGBOOK_ENTRIES_TABLE: Table = Table {
    name: "songbook_entries",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_key", &SqlType::Text, non_null = true),
        sqlite_column!(
            "popularity",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "coverage_breadth",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "is_classic",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "has_singable_version",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("1")
        ),
        sqlite_column!("duration_sec", &SqlType::Integer),
        sqlite_column!(
            "explicit",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("decade", &SqlType::Integer),
        sqlite_column!("isrc", &SqlType::Text),
    ],
    indices: &[
        ("idx_songbook_entries_artist_key", "artist_key"),
        ("idx_songbook_entries_coverage", "coverage_breadth"),
    ],
};

const SONGBOOK_LINKS_TABLE: Table = Table {
    name: "songbook_links",
    columns: &[
        sqlite_column!("entry_id", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("recording_mbid", &SqlType::Text),
        sqlite_column!("spotify_id", &SqlType::Text),
        sqlite_column!("match_method", &SqlType::Text, non_null = true),
        sqlite_column!("confidence", &SqlType::Real, non_null = true),
        sqlite_column!(
            "linked_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_songbook_links_method", "match_method")],
};

pub const SONGBOOK_SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    tables: &[SONGBOOK_ENTRIES_TABLE, SONGBOOK_LINKS_TABLE],
};
