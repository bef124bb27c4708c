//! SQLite schema for the reference database.
//!
//! Two tables: canonical artists and canonical recordings. The
//! cross-reference indices (ISRC, Spotify id) live as indexed columns on
//! the recording/artist rows; the normalized name columns are the
//! comparison-key index that name resolution queries against.

use crate::sqlite_column;
use crate::sqlite_persistence::{Column, SqlType, Table, VersionedSchema};

const REF_ARTISTS_TABLE: Table = Table {
    name: "ref_artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("mbid", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("normalized_name", &SqlType::Text, non_null = true),
        sqlite_column!("disambiguation", &SqlType::Text),
        sqlite_column!("spotify_id", &SqlType::Text),
        sqlite_column!("popularity", &SqlType::Integer),
        sqlite_column!("genres", &SqlType::Text), // JSON array, null when unenriched
    ],
    indices: &[
        ("idx_ref_artists_normalized_name", "normalized_name"),
        ("idx_ref_artists_spotify_id", "spotify_id"),
    ],
};

const REF_RECORDINGS_TABLE: Table = Table {
    name: "ref_recordings",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("mbid", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("normalized_title", &SqlType::Text, non_null = true),
        sqlite_column!("artist_mbid", &SqlType::Text, non_null = true),
        sqlite_column!("duration_ms", &SqlType::Integer),
        sqlite_column!("isrc", &SqlType::Text),
        sqlite_column!("spotify_id", &SqlType::Text),
        sqlite_column!("tempo", &SqlType::Real),
        sqlite_column!("mode", &SqlType::Integer),
        sqlite_column!("energy", &SqlType::Real),
        sqlite_column!("valence", &SqlType::Real),
    ],
    indices: &[
        ("idx_ref_recordings_normalized_title", "normalized_title"),
        ("idx_ref_recordings_artist_mbid", "artist_mbid"),
        ("idx_ref_recordings_isrc", "isrc"),
    ],
};

pub const REFERENCE_SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    tables: &[REF_ARTISTS_TABLE, REF_RECORDINGS_TABLE],
};
