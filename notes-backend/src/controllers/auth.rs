use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::auth::{credentials, AuthenticatedUser, SessionError, TOKEN_COOKIE};
use crate::error::ApiError;
use crate::models::{CredentialsRequest, PublicUser, UserResponse};
use crate::validators::validate_credentials;
use crate::AppState;

/// Register a new user
async fn signup(
    data: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = validate_credentials(body.into_inner())?;

    let repo = Arc::clone(&data.db);
    let user = web::block(move || credentials::register(repo.as_ref(), &username, &password))
        .await??;

    log::info!("[AUTH] Registered user {}", user.id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "User registered successfully",
        "user": PublicUser::from(&user),
    })))
}

/// Exchange credentials for a session token (body + httpOnly cookie)
async fn login(
    data: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> Result<HttpResponse, ApiError> {
    let (username, password) = validate_credentials(body.into_inner())?;

    let repo = Arc::clone(&data.db);
    let user = web::block(move || credentials::verify(repo.as_ref(), &username, &password))
        .await??;

    let token = data.sessions.issue(&user.id);
    let cookie = Cookie::build(TOKEN_COOKIE, token.clone())
        .path("/")
        .http_only(true)
        .secure(data.config.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(data.sessions.ttl().num_seconds()))
        .finish();

    log::info!("[AUTH] User {} logged in", user.id);

    Ok(HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "status": true,
        "message": "User login successfully",
        "user": PublicUser::from(&user),
        "token": token,
    })))
}

/// Current user, without the password hash
async fn me(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let Some(user) = data.db.find_user_by_id(&caller.user_id)? else {
        log::warn!("[AUTH] Valid token for unknown user {}", caller.user_id);
        return Err(SessionError::InvalidToken.into());
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Fetched current loggedin user successfully",
        "user": UserResponse::from(user),
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/get-loggedinUser", web::get().to(me)),
    );
}
