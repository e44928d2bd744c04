pub mod repository;
pub mod sqlite;
pub mod tables;

pub use repository::{NoteFilter, NoteRepository, Repository, StoreError, UserRepository};
pub use sqlite::Database;
