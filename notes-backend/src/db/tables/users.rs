//! User database operations

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::repository::{StoreError, UserRepository};
use crate::db::sqlite::{is_unique_violation, timestamp_column, uuid_column};
use crate::models::UserRecord;
use super::super::Database;

const USER_COLUMNS: &str = "id, username, password_hash, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    Ok(UserRecord {
        id: uuid_column(0, &id)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: timestamp_column(3, &created_at)?,
    })
}

impl UserRepository for Database {
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserRecord, StoreError> {
        let conn = self.conn.lock();
        let id = Uuid::new_v4();
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO users (id, username, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id.to_string(), username, password_hash, created_at.to_rfc3339()],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateUsername
            } else {
                StoreError::Sqlite(e)
            }
        })?;

        Ok(UserRecord {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS),
                [username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    fn find_user_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>, StoreError> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                [id.to_string()],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }
}
