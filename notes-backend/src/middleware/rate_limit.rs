//! Per-client request limiter keyed by IP.
//!
//! Each client gets a GCRA quota of `max_requests` per window: the full
//! allowance may be spent as a burst and replenishes one request every
//! `window / max_requests`.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpResponse};
use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DashMapStateStore;
use governor::Quota;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::ApiError;
use crate::AppState;

/// Idle clients are swept once more than this many are tracked.
const SWEEP_THRESHOLD: usize = 10_000;

type KeyedLimiter<C> =
    governor::RateLimiter<String, DashMapStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

pub struct RateLimiter<C: Clock = DefaultClock> {
    /// `None` when limiting is disabled
    limiter: Option<KeyedLimiter<C>>,
}

impl RateLimiter {
    /// `max_requests == 0` disables limiting.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, &DefaultClock::default())
    }
}

impl<C: Clock> RateLimiter<C> {
    fn with_clock(max_requests: u32, window: Duration, clock: &C) -> Self {
        let limiter = quota(max_requests, window)
            .map(|quota| KeyedLimiter::<C>::dashmap_with_clock(quota, clock));
        Self { limiter }
    }

    /// Record a request from `client`. Returns false once the client has used
    /// up its allowance.
    pub fn check(&self, client: &str) -> bool {
        let Some(limiter) = &self.limiter else {
            return true;
        };

        if limiter.len() > SWEEP_THRESHOLD {
            self.sweep();
        }

        limiter.check_key(&client.to_string()).is_ok()
    }

    /// Forget clients whose allowance has fully replenished.
    fn sweep(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.limiter.as_ref().map_or(0, |l| l.len())
    }
}

fn quota(max_requests: u32, window: Duration) -> Option<Quota> {
    let burst = NonZeroU32::new(max_requests)?;
    let quota = match Quota::with_period(window / max_requests) {
        Some(quota) => quota,
        None => {
            log::warn!("[RATE_LIMIT] Window {:?} too short, using a per-second quota", window);
            Quota::per_second(burst)
        }
    };
    Some(quota.allow_burst(burst))
}

/// Middleware for `web::scope(..).wrap(from_fn(rate_limit))`.
pub async fn rate_limit<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    if let Some(state) = req.app_data::<web::Data<AppState>>() {
        let client = req
            .peer_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        if !state.rate_limiter.check(&client) {
            log::warn!("[RATE_LIMIT] Rejecting {} {} from {}", req.method(), req.path(), client);
            let response = HttpResponse::from_error(ApiError::RateLimited);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
