//! Per-client request rate limiting
//!
//! Each client IP gets a bucket of `max_requests` that refills evenly over
//! the configured window. Requests without connection info (in-process
//! callers, tests) share a single bucket.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use tracing::debug;

use crate::error::LedgerError;

/// Tracked clients above which idle buckets are dropped.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Shared keyed limiter; cheap to clone.
#[derive(Clone)]
pub struct RequestRateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<Option<IpAddr>>>,
    clock: DefaultClock,
}

impl RequestRateLimiter {
    /// Admits `max_requests` per `window` per client. Zero is treated as one.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let period = (window / burst.get()).max(Duration::from_nanos(1));
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: Arc::new(RateLimiter::keyed(quota)),
            clock: DefaultClock::default(),
        }
    }

    /// Takes one request from `client`'s bucket.
    pub fn check(&self, client: Option<IpAddr>) -> Result<(), LedgerError> {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }

        self.limiter.check_key(&client).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            LedgerError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
        })
    }
}

/// Middleware rejecting requests over the caller's quota with 429.
pub async fn enforce_rate_limit(
    State(limiter): State<RequestRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, LedgerError> {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if let Err(err) = limiter.check(client) {
        debug!(client = ?client, path = %request.uri().path(), "rate limit exceeded");
        return Err(err);
    }

    Ok(next.run(request).await)
}
