//! Error taxonomy shared by every handler, mapped onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::auth::SessionError;
use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field
    #[error("{0}")]
    Validation(String),
    #[error("Username is already taken")]
    DuplicateUsername,
    /// Unknown user and wrong password share this variant and message
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Unauthorized(#[from] SessionError),
    #[error("Invalid {0} ID format")]
    InvalidIdFormat(IdKind),
    #[error("{0} with given Id doesn't exist")]
    NotFound(&'static str),
    #[error("Forbidden - User is not author of note")]
    Forbidden,
    #[error("Too many requests, please try again later.")]
    RateLimited,
    #[error("Internal Server Error")]
    Internal,
}

/// Which identifier failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Note,
    User,
}

impl std::fmt::Display for IdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdKind::Note => write!(f, "Note"),
            IdKind::User => write!(f, "User"),
        }
    }
}

impl ApiError {
    /// Body key used for this error. Input problems use `error`, everything
    /// else `message`.
    fn body_key(&self) -> &'static str {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateUsername => "error",
            _ => "message",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::DuplicateUsername | ApiError::InvalidIdFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = serde_json::Map::new();
        body.insert(self.body_key().to_string(), self.to_string().into());
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            // A correctly signed token for a user that no longer exists
            StoreError::UnknownUser => ApiError::Unauthorized(SessionError::InvalidToken),
            StoreError::Sqlite(e) => {
                log::error!("Database error: {}", e);
                ApiError::Internal
            }
        }
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        log::error!("Blocking task failed: {}", err);
        ApiError::Internal
    }
}
