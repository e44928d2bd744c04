//! SQLite-backed storage

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use uuid::Uuid;

use super::repository::{Repository, StoreError};

pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `database_url` and ensure the schema.
    /// `:memory:` opens a private in-memory database.
    pub fn new(database_url: &str) -> SqliteResult<Self> {
        let conn = if database_url == ":memory:" {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = Path::new(database_url).parent() {
                if !parent.as_os_str().is_empty() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        log::warn!("Failed to create database directory {:?}: {}", parent, e);
                    }
                }
            }
            let conn = Connection::open(database_url)?;
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn
        };

        Self::init(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> SqliteResult<Self> {
        Self::new(":memory:")
    }

    fn init(conn: &Connection) -> SqliteResult<()> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_notes_author ON notes(author_id);

            -- shared_with set; the primary key keeps it duplicate-free
            CREATE TABLE IF NOT EXISTS note_shares (
                note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL,
                shared_at TEXT NOT NULL,
                PRIMARY KEY (note_id, user_id)
            );
            CREATE INDEX IF NOT EXISTS idx_note_shares_user ON note_shares(user_id);",
        )?;
        Ok(())
    }
}

impl Repository for Database {
    fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Decode a UUID stored as TEXT in column `idx`.
pub(crate) fn uuid_column(idx: usize, raw: &str) -> SqliteResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Decode an RFC 3339 timestamp stored as TEXT in column `idx`.
pub(crate) fn timestamp_column(idx: usize, raw: &str) -> SqliteResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// True when `err` is a violated UNIQUE / PRIMARY KEY constraint.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
