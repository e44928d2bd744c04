//! Storage interface used by the handlers and the authorization guard.
//!
//! Every method returns plain value records. Each mutation touches a single
//! user or note and is applied atomically by the implementation.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Note, PopulatedNote, UserRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username is already taken")]
    DuplicateUsername,
    #[error("referenced user does not exist")]
    UnknownUser,
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Which notes a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteFilter {
    All,
    /// Notes authored by, or shared with, this user.
    VisibleTo(Uuid),
}

pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `DuplicateUsername` on an exact username match.
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<UserRecord, StoreError>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    fn find_user_by_id(&self, id: &Uuid) -> Result<Option<UserRecord>, StoreError>;
}

pub trait NoteRepository: Send + Sync {
    /// Create a note with an empty shared list.
    fn create_note(&self, author: &Uuid, title: &str, content: &str) -> Result<Note, StoreError>;

    /// Fetch a note with its author resolved.
    fn get_note(&self, id: &Uuid) -> Result<Option<PopulatedNote>, StoreError>;

    fn list_notes(&self, filter: NoteFilter) -> Result<Vec<PopulatedNote>, StoreError>;

    /// Replace title and content. Author and shared list are untouched.
    fn update_note(&self, id: &Uuid, title: &str, content: &str)
        -> Result<Option<Note>, StoreError>;

    /// Remove a note, returning the removed record.
    fn delete_note(&self, id: &Uuid) -> Result<Option<Note>, StoreError>;

    /// Append `user_id` to the note's shared list unless already present.
    fn add_shared_user(&self, id: &Uuid, user_id: &Uuid) -> Result<Option<Note>, StoreError>;

    /// Case-insensitive substring match on title or content, limited to notes
    /// authored by `author`.
    fn search_notes(&self, author: &Uuid, query: &str) -> Result<Vec<Note>, StoreError>;
}

/// Everything the request handlers need from storage.
pub trait Repository: UserRepository + NoteRepository {
    /// Cheap round trip used by the health endpoint.
    fn ping(&self) -> Result<(), StoreError>;
}
