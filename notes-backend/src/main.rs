use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod auth;
mod config;
mod controllers;
mod db;
mod error;
mod guard;
mod middleware;
mod models;
mod validators;

use auth::SessionIssuer;
use config::Config;
use db::{Database, Repository};
use middleware::RateLimiter;

pub struct AppState {
    pub db: Arc<dyn Repository>,
    pub sessions: Arc<SessionIssuer>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Config,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Notes backend v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env();
    let port = config.port;

    log::info!("Opening database at {}", config.database_url);
    let db = Database::new(&config.database_url)
        .map_err(std::io::Error::other)?;

    let ttl = chrono::Duration::days(config.token_ttl_days);
    let sessions = match config.jwt_secret.as_deref() {
        Some(secret) => SessionIssuer::new(secret, ttl),
        None => {
            log::warn!("[AUTH] JWT_SECRET not set, using a random secret. Sessions will not survive a restart");
            SessionIssuer::with_random_secret(ttl)
        }
    };

    let rate_limiter = RateLimiter::new(
        config.rate_limit_max,
        std::time::Duration::from_secs(config.rate_limit_window_secs),
    );
    if config.rate_limit_max == 0 {
        log::warn!("[RATE_LIMIT] Rate limiting disabled");
    }

    log::info!(
        "Access policy: share={}, read={}",
        config.access.share,
        config.access.read
    );

    let state = web::Data::new(AppState {
        db: Arc::new(db),
        sessions: Arc::new(sessions),
        rate_limiter: Arc::new(rate_limiter),
        config,
    });

    log::info!("Starting notes server on port {}", port);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(middleware::security_headers())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::configure)
    })
    .bind(("0.0.0.0", port))?
    .run();

    let server_handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        log::info!("Received Ctrl+C, shutting down...");

        let server_stop = server_handle.stop(true);
        if tokio::time::timeout(std::time::Duration::from_secs(5), server_stop).await.is_err() {
            log::warn!("Timeout waiting for HTTP server to stop, forcing exit...");
        }

        log::info!("Shutdown complete");
    });

    server.await
}
