//! Declarative SQLite schema definitions with creation and validation.
//!
//! Each store declares its tables as const data, creates them on first open
//! and validates an existing database against the declaration on every open,
//! so a schema drift fails loudly at startup instead of surfacing as a
//! confusing query error later.

use anyhow::{bail, Result};
use rusqlite::{params, Connection};

pub const DEFAULT_TIMESTAMP: &str = "(cast(strftime('%s','now') as int))";

/// Databases created before schema versioning report `user_version` 0; the
/// offset keeps versioned databases unambiguously distinguishable from them.
pub const BASE_DB_VERSION: usize = 90000;

#[macro_export]
macro_rules! sqlite_column {
    ($name:expr, $sql_type:expr $(, $field:ident = $value:expr)*) => {
        {
            // unused_mut: only mutated when optional field assignments are passed
            #[allow(unused_mut)]
            let mut column = Column {
                name: $name,
                sql_type: $sql_type,
                is_primary_key: false,
                non_null: false,
                is_unique: false,
                default_value: None,
            };
            $(
                column.$field = $value;
            )*
            column
        }
    };
}

#[derive(Debug, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
    Real,
}

impl SqlType {
    fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
        }
    }

    fn from_sql(s: &str) -> Option<&'static SqlType> {
        match s {
            "TEXT" => Some(&SqlType::Text),
            "INTEGER" => Some(&SqlType::Integer),
            "REAL" => Some(&SqlType::Real),
            _ => None,
        }
    }
}

pub struct Column {
    pub name: &'static str,
    pub sql_type: &'static SqlType,
    pub is_primary_key: bool,
    pub non_null: bool,
    pub is_unique: bool,
    pub default_value: Option<&'static str>,
}

pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indices: &'static [(&'static str, &'static str)],
}

impl Table {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        let mut column_defs = Vec::with_capacity(self.columns.len());
        for column in self.columns {
            let mut def = format!("{} {}", column.name, column.sql_type.as_sql());
            if column.is_primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if column.non_null {
                def.push_str(" NOT NULL");
            }
            if column.is_unique {
                def.push_str(" UNIQUE");
            }
            if let Some(default_value) = column.default_value {
                def.push_str(&format!(" DEFAULT {}", default_value));
            }
            column_defs.push(def);
        }
        conn.execute(
            &format!("CREATE TABLE {} ({});", self.name, column_defs.join(", ")),
            params![],
        )?;

        for (index_name, column_name) in self.indices {
            conn.execute(
                &format!(
                    "CREATE INDEX {} ON {}({});",
                    index_name, self.name, column_name
                ),
                params![],
            )?;
        }
        Ok(())
    }
}

pub struct VersionedSchema {
    pub version: usize,
    pub tables: &'static [Table],
}

impl VersionedSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        conn.execute("PRAGMA foreign_keys = ON;", params![])?;
        for table in self.tables {
            table.create(conn)?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Validate an existing database against this schema declaration.
    ///
    /// Checks column names, types and null-ness in declaration order, and
    /// that every declared index exists on the right table.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for table in self.tables {
            let mut stmt = conn.prepare(&format!("PRAGMA table_info({});", table.name))?;
            let actual: Vec<(String, String, bool)> = stmt
                .query_map(params![], |row| {
                    Ok((
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)? == 1,
                    ))
                })?
                .collect::<std::result::Result<_, _>>()?;

            if actual.len() != table.columns.len() {
                bail!(
                    "table {} has {} columns, schema declares {} ({})",
                    table.name,
                    actual.len(),
                    table.columns.len(),
                    table
                        .columns
                        .iter()
                        .map(|c| c.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }

            for ((actual_name, actual_type, actual_non_null), expected) in
                actual.iter().zip(table.columns.iter())
            {
                if actual_name != expected.name {
                    bail!(
                        "table {}: expected column {}, found {}",
                        table.name,
                        expected.name,
                        actual_name
                    );
                }
                if SqlType::from_sql(actual_type) != Some(expected.sql_type) {
                    bail!(
                        "table {} column {}: expected type {:?}, found {}",
                        table.name,
                        expected.name,
                        expected.sql_type,
                        actual_type
                    );
                }
                if *actual_non_null != expected.non_null {
                    bail!(
                        "table {} column {}: non-null mismatch",
                        table.name,
                        expected.name
                    );
                }
            }

            for (index_name, _) in table.indices {
                let index_exists: bool = conn
                    .query_row(
                        "SELECT 1 FROM sqlite_master WHERE type='index' AND name=?1 AND tbl_name=?2",
                        params![index_name, table.name],
                        |_| Ok(true),
                    )
                    .unwrap_or(false);
                if !index_exists {
                    bail!("table {} is missing index '{}'", table.name, index_name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_TABLE: Table = Table {
        name: "songs",
        columns: &[
            sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
            sqlite_column!("title", &SqlType::Text, non_null = true),
            sqlite_column!("score", &SqlType::Real),
        ],
        indices: &[("idx_songs_title", "title")],
    };

    const TEST_SCHEMA: VersionedSchema = VersionedSchema {
        version: 1,
        tables: &[TEST_TABLE],
    };

    #[test]
    fn test_create_then_validate_roundtrip() {
        let conn = Connection::open_in_memory().unwrap();
        TEST_SCHEMA.create(&conn).unwrap();
        TEST_SCHEMA.validate(&conn).unwrap();

        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version as usize, BASE_DB_VERSION + 1);
    }

    #[test]
    fn test_validate_detects_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE songs (id INTEGER PRIMARY KEY)", [])
            .unwrap();

        let err = TEST_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("columns"), "unexpected error: {err}");
    }

    #[test]
    fn test_validate_detects_missing_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE songs (id INTEGER PRIMARY KEY, title TEXT NOT NULL, score REAL)",
            [],
        )
        .unwrap();

        let err = TEST_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("missing index"), "unexpected error: {err}");
    }

    #[test]
    fn test_validate_detects_type_mismatch() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE songs (id INTEGER PRIMARY KEY, title INTEGER NOT NULL, score REAL)",
            [],
        )
        .unwrap();
        conn.execute("CREATE INDEX idx_songs_title ON songs(title)", [])
            .unwrap();

        let err = TEST_SCHEMA.validate(&conn).unwrap_err().to_string();
        assert!(err.contains("expected type"), "unexpected error: {err}");
    }
}
