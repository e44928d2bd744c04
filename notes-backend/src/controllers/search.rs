use actix_web::{web, HttpResponse};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::SearchQuery;
use crate::validators::required_query;
use crate::AppState;

/// Keyword search over the caller's own notes
async fn search_notes(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let keyword = required_query("q", query.into_inner().q)?;

    let notes = data.db.search_notes(&caller.user_id, &keyword)?;
    log::debug!(
        "[SEARCH] User {} searched for {:?}, {} hits",
        caller.user_id,
        keyword,
        notes.len()
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Notes list based on keyword fetched successfully",
        "notes": notes,
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/search", web::get().to(search_notes));
}
