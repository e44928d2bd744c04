//! Credential store: registration and username/password verification.
//!
//! Both operations hash with Argon2 and are CPU-bound; handlers run them on
//! the blocking pool.

use once_cell::sync::Lazy;

use super::password::{hash_password, verify_password};
use crate::db::UserRepository;
use crate::error::ApiError;
use crate::models::UserRecord;

/// Verified against when the username is unknown, so both failure paths
/// spend the same time hashing.
static DECOY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("decoy-password").ok());

/// Create a user with a hashed password.
pub fn register<R>(users: &R, username: &str, password: &str) -> Result<UserRecord, ApiError>
where
    R: UserRepository + ?Sized,
{
    // Skip the hash when the name is obviously taken; the UNIQUE constraint
    // still catches a concurrent registration.
    if users.find_user_by_username(username)?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let password_hash = hash_password(password).map_err(|e| {
        log::error!("[AUTH] {}", e);
        ApiError::Internal
    })?;

    Ok(users.insert_user(username, &password_hash)?)
}

/// Check a username/password pair. Unknown users and wrong passwords both
/// yield `InvalidCredentials`.
pub fn verify<R>(users: &R, username: &str, password: &str) -> Result<UserRecord, ApiError>
where
    R: UserRepository + ?Sized,
{
    let Some(user) = users.find_user_by_username(username)? else {
        if let Some(decoy) = DECOY_HASH.as_deref() {
            let _ = verify_password(password, decoy);
        }
        return Err(ApiError::InvalidCredentials);
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => Err(ApiError::InvalidCredentials),
        Err(e) => {
            log::error!("[AUTH] Stored hash for user {} is unreadable: {}", user.id, e);
            Err(ApiError::Internal)
        }
    }
}
