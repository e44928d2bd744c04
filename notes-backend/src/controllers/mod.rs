pub mod auth;
pub mod health;
pub mod notes;
pub mod search;

use actix_web::{middleware::from_fn, web, HttpResponse, Responder};

use crate::middleware::rate_limit;
use crate::validators;

/// Register every route: `/` plus the rate-limited `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validators::json_config())
        .app_data(validators::query_config())
        .route("/", web::get().to(index))
        .service(
            web::scope("/api")
                .wrap(from_fn(rate_limit))
                .configure(health::config_routes)
                .configure(auth::config)
                .configure(notes::config)
                .configure(search::config),
        );
}

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Hello World")
}
