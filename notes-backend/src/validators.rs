//! Request body validation.
//!
//! Messages follow the `"<field>" is required` format the API has always
//! returned.

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};
use uuid::Uuid;

use crate::error::{ApiError, IdKind};
use crate::models::{CredentialsRequest, NoteRequest};

/// A field that must be present and non-empty.
pub fn required_string(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        None => Err(ApiError::Validation(format!("\"{}\" is required", field))),
        Some(v) if v.is_empty() => Err(ApiError::Validation(format!(
            "\"{}\" is not allowed to be empty",
            field
        ))),
        Some(v) => Ok(v),
    }
}

/// A query parameter that must be present. Empty is allowed.
pub fn required_query(field: &str, value: Option<String>) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("\"{}\" is required", field)))
}

/// Returns `(username, password)`.
pub fn validate_credentials(body: CredentialsRequest) -> Result<(String, String), ApiError> {
    let username = required_string("username", body.username)?;
    let password = required_string("password", body.password)?;
    Ok((username, password))
}

/// Returns `(title, content)`.
pub fn validate_note(body: NoteRequest) -> Result<(String, String), ApiError> {
    let title = required_string("title", body.title)?;
    let content = required_string("content", body.content)?;
    Ok((title, content))
}

/// Parse a path or body identifier.
pub fn parse_id(raw: &str, kind: IdKind) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::InvalidIdFormat(kind))
}

/// JSON extractor config: bodies that fail to decode become 400 validation
/// errors with a JSON body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .content_type_required(false)
        .error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::Deserialize(e) if e.is_eof() => "Request body is required".to_string(),
        JsonPayloadError::Deserialize(e) => e.to_string(),
        other => other.to_string(),
    };
    ApiError::Validation(message).into()
}

/// Query extractor config: undecodable query strings become 400 validation
/// errors, same as bodies.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error_handler)
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        QueryPayloadError::Deserialize(e) => e.to_string(),
        other => other.to_string(),
    };
    ApiError::Validation(message).into()
}
