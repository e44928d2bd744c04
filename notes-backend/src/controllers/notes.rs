//! Notes REST API: CRUD plus sharing.
//!
//! Every route requires a session. Edits and deletes are author-only; who may
//! share and who may see a note follow the configured `AccessPolicy`.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiError, IdKind};
use crate::guard;
use crate::models::{NoteRequest, PopulatedNote, ShareNoteRequest};
use crate::validators::{parse_id, validate_note};
use crate::AppState;

const NOTE: &str = "Note";

/// Load a note the caller is allowed to know about. Under a scoped read
/// policy, notes the caller cannot read are reported as missing.
fn fetch_visible_note(
    data: &AppState,
    note_id: &Uuid,
    caller: &Uuid,
) -> Result<PopulatedNote, ApiError> {
    match data.db.get_note(note_id)? {
        Some(note) if guard::is_visible(&note, caller, data.config.access.read) => Ok(note),
        _ => Err(ApiError::NotFound(NOTE)),
    }
}

async fn create_note(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    body: web::Json<NoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let (title, content) = validate_note(body.into_inner())?;

    let note = data.db.create_note(&caller.user_id, &title, &content)?;
    log::debug!("[NOTES] User {} created note {}", caller.user_id, note.id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Note created successfully",
        "note": note,
    })))
}

async fn list_notes(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let filter = guard::listing_filter(&caller.user_id, data.config.access.read);
    let notes = data.db.list_notes(filter)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Fetched all notes for authenticated User",
        "totalNotes": notes.len(),
        "notes": notes,
    })))
}

async fn get_note(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let note_id = parse_id(&path, IdKind::Note)?;
    let note = fetch_visible_note(&data, &note_id, &caller.user_id)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Note with given Id fetched successfully",
        "note": note,
    })))
}

async fn update_note(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<NoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let (title, content) = validate_note(body.into_inner())?;
    let note_id = parse_id(&path, IdKind::Note)?;

    let existing = fetch_visible_note(&data, &note_id, &caller.user_id)?;
    guard::ensure_can_mutate(&existing, &caller.user_id)?;

    // Deleted between the read and the write
    let note = data
        .db
        .update_note(&note_id, &title, &content)?
        .ok_or(ApiError::NotFound(NOTE))?;
    log::debug!("[NOTES] User {} updated note {}", caller.user_id, note_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Note updated successfully",
        "note": note,
    })))
}

async fn delete_note(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let note_id = parse_id(&path, IdKind::Note)?;

    let existing = fetch_visible_note(&data, &note_id, &caller.user_id)?;
    guard::ensure_can_mutate(&existing, &caller.user_id)?;

    let deleted = data
        .db
        .delete_note(&note_id)?
        .ok_or(ApiError::NotFound(NOTE))?;
    log::info!("[NOTES] User {} deleted note {}", caller.user_id, note_id);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Note deleted successfully",
        "deletedNote": deleted,
    })))
}

async fn share_note(
    data: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<ShareNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let target = body
        .into_inner()
        .shared_user_id
        .ok_or(ApiError::InvalidIdFormat(IdKind::User))
        .and_then(|raw| parse_id(&raw, IdKind::User))?;
    let note_id = parse_id(&path, IdKind::Note)?;

    let existing = fetch_visible_note(&data, &note_id, &caller.user_id)?;
    guard::ensure_can_share(&existing, &caller.user_id, &data.config.access)?;

    let note = data
        .db
        .add_shared_user(&note_id, &target)?
        .ok_or(ApiError::NotFound(NOTE))?;
    log::info!(
        "[NOTES] User {} shared note {} with {}",
        caller.user_id,
        note_id,
        target
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": true,
        "message": "Note shared successfully",
        "note": note,
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/notes")
            .route("", web::post().to(create_note))
            .route("", web::get().to(list_notes))
            .route("/", web::post().to(create_note))
            .route("/", web::get().to(list_notes))
            .route("/{id}", web::get().to(get_note))
            .route("/{id}", web::put().to(update_note))
            .route("/{id}", web::delete().to(delete_note))
            .route("/{id}/share", web::post().to(share_note)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessPolicy, Config, ReadScope, SharePolicy};
    use crate::db::NoteFilter;
    use crate::controllers::{configure, test_support};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }

    fn create(state: &AppState, author: &Uuid, title: &str, content: &str) -> String {
        state
            .db
            .create_note(author, title, content)
            .expect("Failed to create test note")
            .id
            .to_string()
    }

    fn scoped_config(share: SharePolicy, read: ReadScope) -> Config {
        Config {
            rate_limit_max: 0,
            access: AccessPolicy { share, read },
            ..Config::default()
        }
    }

    #[actix_web::test]
    async fn test_end_to_end_note_lifecycle() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, token) = test_support::register(&state, "alice");

        let req = test::TestRequest::post()
            .uri("/api/notes")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Hello", "content": "World" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Note created successfully");
        assert_eq!(body["note"]["author"], alice_id.to_string());
        assert_eq!(body["note"]["sharedWith"], json!([]));
        let note_id = body["note"]["_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Note with given Id fetched successfully");
        assert_eq!(body["note"]["title"], "Hello");
        assert_eq!(body["note"]["content"], "World");
        assert_eq!(
            body["note"]["author"],
            json!({ "id": alice_id, "username": "alice" })
        );

        let req = test::TestRequest::put()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Hi", "content": "World" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Note updated successfully");
        assert_eq!(body["note"]["title"], "Hi");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Note deleted successfully");
        assert_eq!(body["deletedNote"]["_id"], note_id);
        assert_eq!(body["deletedNote"]["title"], "Hi");

        let req = test::TestRequest::get()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Note with given Id doesn't exist");
    }

    #[actix_web::test]
    async fn test_routes_require_a_token() {
        let app = test::init_service(App::new().app_data(test_support::state()).configure(configure)).await;
        let id = Uuid::new_v4();

        let requests = vec![
            test::TestRequest::post()
                .uri("/api/notes")
                .set_json(json!({ "title": "T", "content": "C" })),
            test::TestRequest::get().uri("/api/notes"),
            test::TestRequest::get().uri(&format!("/api/notes/{}", id)),
            test::TestRequest::put()
                .uri(&format!("/api/notes/{}", id))
                .set_json(json!({ "title": "T", "content": "C" })),
            test::TestRequest::delete().uri(&format!("/api/notes/{}", id)),
            test::TestRequest::post()
                .uri(&format!("/api/notes/{}/share", id))
                .set_json(json!({ "sharedUserId": Uuid::new_v4() })),
        ];

        for req in requests {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Unauthorized - No token provided");
        }

        let req = test::TestRequest::get()
            .uri("/api/notes")
            .insert_header(bearer("malformed"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Unauthorized - Invalid token");
    }

    #[actix_web::test]
    async fn test_cookie_session_works_for_notes() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (_, token) = test_support::register(&state, "alice");

        let req = test::TestRequest::post()
            .uri("/api/notes")
            .cookie(actix_web::cookie::Cookie::new("token", token))
            .set_json(json!({ "title": "T", "content": "C" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_create_validation() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (_, token) = test_support::register(&state, "alice");

        let cases = [
            (json!({ "title": "", "content": "C" }), "\"title\" is not allowed to be empty"),
            (json!({ "title": "T" }), "\"content\" is required"),
        ];
        for (payload, expected) in cases {
            let req = test::TestRequest::post()
                .uri("/api/notes")
                .insert_header(bearer(&token))
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["error"], expected);
        }
        assert!(state.db.list_notes(NoteFilter::All).unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_malformed_and_missing_ids() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (_, token) = test_support::register(&state, "alice");

        let req = test::TestRequest::get()
            .uri("/api/notes/not-an-id")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid Note ID format");

        let missing = Uuid::new_v4();
        let requests = vec![
            test::TestRequest::get().uri(&format!("/api/notes/{}", missing)),
            test::TestRequest::put()
                .uri(&format!("/api/notes/{}", missing))
                .set_json(json!({ "title": "T", "content": "C" })),
            test::TestRequest::delete().uri(&format!("/api/notes/{}", missing)),
        ];
        for req in requests {
            let resp = test::call_service(&app, req.insert_header(bearer(&token)).to_request()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
    }

    #[actix_web::test]
    async fn test_non_author_cannot_update_or_delete() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let (_, bob) = test_support::register(&state, "bob");
        let note_id = create(&state, &alice_id, "Mine", "Private");

        let req = test::TestRequest::put()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&bob))
            .set_json(json!({ "title": "Stolen", "content": "x" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Forbidden - User is not author of note");

        let req = test::TestRequest::delete()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&bob))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("/api/notes/{}", note_id))
            .insert_header(bearer(&alice))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["note"]["title"], "Mine");
        assert_eq!(body["note"]["content"], "Private");
    }

    #[actix_web::test]
    async fn test_listing_is_unscoped_by_default() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let (bob_id, _) = test_support::register(&state, "bob");
        create(&state, &alice_id, "A", "a");
        create(&state, &bob_id, "B", "b");

        let req = test::TestRequest::get()
            .uri("/api/notes")
            .insert_header(bearer(&alice))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "Fetched all notes for authenticated User");
        assert_eq!(body["totalNotes"], 2);
        assert_eq!(body["notes"][0]["title"], "A");
        assert_eq!(
            body["notes"][1]["author"],
            json!({ "id": bob_id, "username": "bob" })
        );
    }

    #[actix_web::test]
    async fn test_collection_accepts_trailing_slash() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (_, token) = test_support::register(&state, "alice");

        let req = test::TestRequest::post()
            .uri("/api/notes/")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "T", "content": "C" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/notes/")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["totalNotes"], 1);
    }

    #[actix_web::test]
    async fn test_scoped_reads_hide_other_users_notes() {
        let state = test_support::state_with(scoped_config(
            SharePolicy::AnyAuthenticated,
            ReadScope::OwnerOrShared,
        ));
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let (bob_id, bob) = test_support::register(&state, "bob");
        let private = create(&state, &alice_id, "Private", "a");
        let shared = create(&state, &alice_id, "Shared", "a");
        create(&state, &bob_id, "Bob's", "b");

        let req = test::TestRequest::post()
            .uri(&format!("/api/notes/{}/share", shared))
            .insert_header(bearer(&alice))
            .set_json(json!({ "sharedUserId": bob_id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/notes")
            .insert_header(bearer(&bob))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalNotes"], 2);
        let titles: Vec<&str> = body["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Shared", "Bob's"]);

        let req = test::TestRequest::get()
            .uri(&format!("/api/notes/{}", private))
            .insert_header(bearer(&bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri(&format!("/api/notes/{}", shared))
            .insert_header(bearer(&bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Shared readers still cannot edit
        let req = test::TestRequest::put()
            .uri(&format!("/api/notes/{}", shared))
            .insert_header(bearer(&bob))
            .set_json(json!({ "title": "x", "content": "y" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_share_is_idempotent_and_open_to_any_caller() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let (bob_id, _) = test_support::register(&state, "bob");
        let (_, carol) = test_support::register(&state, "carol");
        let note_id = create(&state, &alice_id, "T", "C");

        // carol is not the author
        for token in [&carol, &alice] {
            let req = test::TestRequest::post()
                .uri(&format!("/api/notes/{}/share", note_id))
                .insert_header(bearer(token))
                .set_json(json!({ "sharedUserId": bob_id }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Note shared successfully");
            assert_eq!(body["note"]["sharedWith"], json!([bob_id]));
        }
    }

    #[actix_web::test]
    async fn test_owner_only_share_policy() {
        let state = test_support::state_with(scoped_config(
            SharePolicy::OwnerOnly,
            ReadScope::Unscoped,
        ));
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let (bob_id, bob) = test_support::register(&state, "bob");
        let note_id = create(&state, &alice_id, "T", "C");

        let req = test::TestRequest::post()
            .uri(&format!("/api/notes/{}/share", note_id))
            .insert_header(bearer(&bob))
            .set_json(json!({ "sharedUserId": bob_id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri(&format!("/api/notes/{}/share", note_id))
            .insert_header(bearer(&alice))
            .set_json(json!({ "sharedUserId": bob_id }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_share_rejects_bad_ids() {
        let state = test_support::state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (alice_id, alice) = test_support::register(&state, "alice");
        let note_id = create(&state, &alice_id, "T", "C");

        let cases = [
            (note_id.clone(), json!({ "sharedUserId": "nope" }), StatusCode::BAD_REQUEST, "Invalid User ID format"),
            (note_id.clone(), json!({}), StatusCode::BAD_REQUEST, "Invalid User ID format"),
            ("nope".to_string(), json!({ "sharedUserId": Uuid::new_v4() }), StatusCode::BAD_REQUEST, "Invalid Note ID format"),
            (Uuid::new_v4().to_string(), json!({ "sharedUserId": Uuid::new_v4() }), StatusCode::NOT_FOUND, "Note with given Id doesn't exist"),
        ];
        for (id, payload, status, message) in cases {
            let req = test::TestRequest::post()
                .uri(&format!("/api/notes/{}/share", id))
                .insert_header(bearer(&alice))
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), status);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], message);
        }
    }

    #[actix_web::test]
    async fn test_rate_limit_rejects_with_429() {
        let state = test_support::state_with(Config {
            rate_limit_max: 2,
            ..Config::default()
        });
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let (_, token) = test_support::register(&state, "alice");

        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri("/api/notes")
                .insert_header(bearer(&token))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/notes")
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Too many requests, please try again later.");

        // The root route sits outside the limited scope
        let req = test::TestRequest::get().uri("/").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
