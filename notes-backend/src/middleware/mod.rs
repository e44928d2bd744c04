pub mod rate_limit;

use actix_web::middleware::DefaultHeaders;

pub use rate_limit::{rate_limit, RateLimiter};

/// Conservative response headers added to every response.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("X-DNS-Prefetch-Control", "off"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
}
