pub mod note;
pub mod user;

pub use note::{Note, NoteRequest, PopulatedNote, SearchQuery, ShareNoteRequest};
pub use user::{CredentialsRequest, PublicUser, UserRecord, UserResponse};
