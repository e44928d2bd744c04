use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A note as stored, with the author as a bare user id.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Uuid,
    /// Insertion-ordered, no duplicates
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Author reference resolved for listing and fetch-by-id
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NoteAuthor {
    pub id: Uuid,
    pub username: String,
}

/// A note with its author resolved to `{id, username}`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedNote {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: NoteAuthor,
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedNote {
    pub fn from_note(note: Note, author_username: String) -> Self {
        PopulatedNote {
            id: note.id,
            title: note.title,
            content: note.content,
            author: NoteAuthor {
                id: note.author,
                username: author_username,
            },
            shared_with: note.shared_with,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }

    /// Drop the resolved author, keeping only its id.
    pub fn into_note(self) -> Note {
        Note {
            id: self.id,
            title: self.title,
            content: self.content,
            author: self.author.id,
            shared_with: self.shared_with,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Body of create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of the share endpoint
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareNoteRequest {
    pub shared_user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}
