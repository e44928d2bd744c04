//! Session authentication for incoming requests.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use super::SessionError;
use crate::error::ApiError;
use crate::AppState;

/// Name of the cookie set at login
pub const TOKEN_COOKIE: &str = "token";

/// Pull the session token from `Authorization: Bearer <token>`, falling back
/// to the `token` cookie. The header wins when both are present.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let from_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    from_header.or_else(|| {
        req.cookie(TOKEN_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// Validate the session token on `req` and return the caller's user id.
pub fn validate_session_from_request(state: &AppState, req: &HttpRequest) -> Result<Uuid, ApiError> {
    let token = token_from_request(req).ok_or(SessionError::MissingToken)?;
    let user_id = state.sessions.verify(&token)?;
    Ok(user_id)
}

/// The authenticated caller. Extracting it rejects the request with 401 when
/// no valid session token is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            log::error!("[AUTH] AppState missing from app data");
            return ready(Err(ApiError::Internal));
        };

        ready(validate_session_from_request(state, req).map(|user_id| AuthenticatedUser { user_id }))
    }
}
