//! Authorization guard: pure decisions about what a caller may do to a note.

use uuid::Uuid;

use crate::config::{AccessPolicy, ReadScope, SharePolicy};
use crate::db::NoteFilter;
use crate::error::ApiError;
use crate::models::{Note, PopulatedNote};

/// Ownership and sharing facts the guard decides on.
pub trait NoteAccess {
    fn author_id(&self) -> &Uuid;
    fn shared_user_ids(&self) -> &[Uuid];
}

impl NoteAccess for Note {
    fn author_id(&self) -> &Uuid {
        &self.author
    }

    fn shared_user_ids(&self) -> &[Uuid] {
        &self.shared_with
    }
}

impl NoteAccess for PopulatedNote {
    fn author_id(&self) -> &Uuid {
        &self.author.id
    }

    fn shared_user_ids(&self) -> &[Uuid] {
        &self.shared_with
    }
}

/// Only the author may edit or delete.
pub fn can_mutate(note: &impl NoteAccess, caller: &Uuid) -> bool {
    note.author_id() == caller
}

pub fn can_share(note: &impl NoteAccess, caller: &Uuid, policy: SharePolicy) -> bool {
    match policy {
        SharePolicy::AnyAuthenticated => true,
        SharePolicy::OwnerOnly => can_mutate(note, caller),
    }
}

/// Author or a member of the shared list.
pub fn can_read(note: &impl NoteAccess, caller: &Uuid) -> bool {
    can_mutate(note, caller) || note.shared_user_ids().contains(caller)
}

/// Whether `note` exists as far as `caller` is concerned.
pub fn is_visible(note: &impl NoteAccess, caller: &Uuid, scope: ReadScope) -> bool {
    match scope {
        ReadScope::Unscoped => true,
        ReadScope::OwnerOrShared => can_read(note, caller),
    }
}

/// Store-level filter for listing under `scope`.
pub fn listing_filter(caller: &Uuid, scope: ReadScope) -> NoteFilter {
    match scope {
        ReadScope::Unscoped => NoteFilter::All,
        ReadScope::OwnerOrShared => NoteFilter::VisibleTo(*caller),
    }
}

pub fn ensure_can_mutate(note: &impl NoteAccess, caller: &Uuid) -> Result<(), ApiError> {
    if can_mutate(note, caller) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

pub fn ensure_can_share(
    note: &impl NoteAccess,
    caller: &Uuid,
    policy: &AccessPolicy,
) -> Result<(), ApiError> {
    if can_share(note, caller, policy.share) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}
