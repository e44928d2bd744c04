//! Note database operations (notes + shared-with set)

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::repository::{NoteFilter, NoteRepository, StoreError};
use crate::db::sqlite::{is_foreign_key_violation, timestamp_column, uuid_column};
use crate::models::{Note, PopulatedNote};
use super::super::Database;

const NOTE_COLUMNS: &str = "n.id, n.title, n.content, n.author_id, n.created_at, n.updated_at";

/// Read the six `NOTE_COLUMNS`. `shared_with` is filled in separately.
fn note_from_row(row: &Row<'_>) -> SqliteResult<Note> {
    let id: String = row.get(0)?;
    let author: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let updated_at: String = row.get(5)?;
    Ok(Note {
        id: uuid_column(0, &id)?,
        title: row.get(1)?,
        content: row.get(2)?,
        author: uuid_column(3, &author)?,
        shared_with: Vec::new(),
        created_at: timestamp_column(4, &created_at)?,
        updated_at: timestamp_column(5, &updated_at)?,
    })
}

/// `NOTE_COLUMNS` followed by the author's username
fn populated_from_row(row: &Row<'_>) -> SqliteResult<PopulatedNote> {
    let note = note_from_row(row)?;
    let username: String = row.get(6)?;
    Ok(PopulatedNote::from_note(note, username))
}

fn shared_users(conn: &Connection, note_id: &Uuid) -> SqliteResult<Vec<Uuid>> {
    let mut stmt =
        conn.prepare_cached("SELECT user_id FROM note_shares WHERE note_id = ?1 ORDER BY rowid")?;
    let rows = stmt.query_map([note_id.to_string()], |row| {
        let raw: String = row.get(0)?;
        uuid_column(0, &raw)
    })?;
    rows.collect()
}

/// Shared-with lists for every note, keyed by note id
fn all_shared_users(conn: &Connection) -> SqliteResult<HashMap<Uuid, Vec<Uuid>>> {
    let mut stmt = conn.prepare("SELECT note_id, user_id FROM note_shares ORDER BY rowid")?;
    let rows = stmt.query_map([], |row| {
        let note_id: String = row.get(0)?;
        let user_id: String = row.get(1)?;
        Ok((uuid_column(0, &note_id)?, uuid_column(1, &user_id)?))
    })?;

    let mut shares: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in rows {
        let (note_id, user_id) = row?;
        shares.entry(note_id).or_default().push(user_id);
    }
    Ok(shares)
}

fn load_note(conn: &Connection, id: &Uuid) -> SqliteResult<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {} FROM notes n WHERE n.id = ?1", NOTE_COLUMNS),
            [id.to_string()],
            note_from_row,
        )
        .optional()?;

    match note {
        Some(mut note) => {
            note.shared_with = shared_users(conn, id)?;
            Ok(Some(note))
        }
        None => Ok(None),
    }
}

impl NoteRepository for Database {
    fn create_note(&self, author: &Uuid, title: &str, content: &str) -> Result<Note, StoreError> {
        let conn = self.conn.lock();
        let id = Uuid::new_v4();
        let now = Utc::now();
        let now_str = now.to_rfc3339();

        conn.execute(
            "INSERT INTO notes (id, title, content, author_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![id.to_string(), title, content, author.to_string(), &now_str],
        )
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::UnknownUser
            } else {
                StoreError::Sqlite(e)
            }
        })?;

        Ok(Note {
            id,
            title: title.to_string(),
            content: content.to_string(),
            author: *author,
            shared_with: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_note(&self, id: &Uuid) -> Result<Option<PopulatedNote>, StoreError> {
        let conn = self.conn.lock();
        let note = conn
            .query_row(
                &format!(
                    "SELECT {}, u.username FROM notes n
                     JOIN users u ON u.id = n.author_id
                     WHERE n.id = ?1",
                    NOTE_COLUMNS
                ),
                [id.to_string()],
                populated_from_row,
            )
            .optional()?;

        match note {
            Some(mut note) => {
                note.shared_with = shared_users(&conn, id)?;
                Ok(Some(note))
            }
            None => Ok(None),
        }
    }

    fn list_notes(&self, filter: NoteFilter) -> Result<Vec<PopulatedNote>, StoreError> {
        let conn = self.conn.lock();

        let base = format!(
            "SELECT {}, u.username FROM notes n JOIN users u ON u.id = n.author_id",
            NOTE_COLUMNS
        );
        let mut notes = match filter {
            NoteFilter::All => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY n.rowid", base))?;
                let rows = stmt.query_map([], populated_from_row)?;
                rows.collect::<SqliteResult<Vec<_>>>()?
            }
            NoteFilter::VisibleTo(user_id) => {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE n.author_id = ?1
                        OR EXISTS (SELECT 1 FROM note_shares s
                                   WHERE s.note_id = n.id AND s.user_id = ?1)
                     ORDER BY n.rowid",
                    base
                ))?;
                let rows = stmt.query_map([user_id.to_string()], populated_from_row)?;
                rows.collect::<SqliteResult<Vec<_>>>()?
            }
        };

        let mut shares = all_shared_users(&conn)?;
        for note in notes.iter_mut() {
            note.shared_with = shares.remove(&note.id).unwrap_or_default();
        }

        Ok(notes)
    }

    fn update_note(
        &self,
        id: &Uuid,
        title: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "UPDATE notes SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
            params![title, content, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        let note = load_note(&tx, id)?;
        tx.commit()?;
        Ok(note)
    }

    fn delete_note(&self, id: &Uuid) -> Result<Option<Note>, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(note) = load_note(&tx, id)? else {
            return Ok(None);
        };
        // note_shares rows go with it (ON DELETE CASCADE)
        tx.execute("DELETE FROM notes WHERE id = ?1", [id.to_string()])?;
        tx.commit()?;

        Ok(Some(note))
    }

    fn add_shared_user(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Note>, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM notes WHERE id = ?1)",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }

        let now = Utc::now().to_rfc3339();
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO note_shares (note_id, user_id, shared_at) VALUES (?1, ?2, ?3)",
            params![id.to_string(), user_id.to_string(), &now],
        )?;
        if inserted > 0 {
            tx.execute(
                "UPDATE notes SET updated_at = ?1 WHERE id = ?2",
                params![&now, id.to_string()],
            )?;
        }

        let note = load_note(&tx, id)?;
        tx.commit()?;
        Ok(note)
    }

    fn search_notes(&self, author: &Uuid, query: &str) -> Result<Vec<Note>, StoreError> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes n WHERE n.author_id = ?1 ORDER BY n.rowid",
            NOTE_COLUMNS
        ))?;
        let candidates = stmt
            .query_map([author.to_string()], note_from_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        // SQLite's LIKE only folds ASCII, so matching happens here
        let needle = query.to_lowercase();
        let mut matches = Vec::new();
        for mut note in candidates {
            if note.title.to_lowercase().contains(&needle)
                || note.content.to_lowercase().contains(&needle)
            {
                note.shared_with = shared_users(&conn, &note.id)?;
                matches.push(note);
            }
        }

        Ok(matches)
    }
}
