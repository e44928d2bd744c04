use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)));
    cfg.service(web::resource("/version").route(web::get().to(get_version)));
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let database = match state.db.ping() {
        Ok(()) => "ok",
        Err(e) => {
            log::error!("Health check: database unreachable: {}", e);
            "unavailable"
        }
    };

    let body = serde_json::json!({
        "status": if database == "ok" { "ok" } else { "degraded" },
        "version": VERSION,
        "database": database,
        "sharePolicy": state.config.access.share.to_string(),
        "readScope": state.config.access.read.to_string(),
    });

    if database == "ok" {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

async fn get_version() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "version": VERSION
    }))
}
