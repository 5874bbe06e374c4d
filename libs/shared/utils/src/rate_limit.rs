//! Process-wide request rate limiting (§5): 100 requests per 15 minutes per
//! client identity, a DoS cushion unrelated to the booking quota machinery in
//! §4.1/§6. Grounded on the ancestor's `production_performance.rs`
//! `SlidingWindowRateLimiter`/`RateLimitConfig` (per-identifier sliding-window
//! counters), narrowed to one per-client-identity quota and moved onto
//! `governor`'s keyed limiter rather than a hand-rolled window.

use std::num::NonZeroU32;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use shared_models::ApiError;

const MAX_REQUESTS: u32 = 100;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Identity defaults to the caller's IP as seen through the usual reverse-proxy
/// headers; callers with neither header share a single "unknown" bucket,
/// which only matters when the service sits directly on the internet with no
/// proxy in front of it.
fn client_identity(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()).map(|s| s.trim().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub struct ClientRateLimiter {
    limiter: GovernorRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
}

impl ClientRateLimiter {
    pub fn new() -> Self {
        let quota = Quota::with_period(WINDOW)
            .expect("window is non-zero")
            .allow_burst(NonZeroU32::new(MAX_REQUESTS).expect("MAX_REQUESTS is non-zero"));
        Self { limiter: GovernorRateLimiter::keyed(quota) }
    }

    pub fn check(&self, client: &str) -> Result<(), ApiError> {
        self.limiter.check_key(&client.to_string()).map_err(|_| ApiError::RateLimit)
    }
}

impl Default for ClientRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<std::sync::Arc<ClientRateLimiter>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_identity(request.headers());
    limiter.check(&client)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_quota_then_rejects() {
        let limiter = ClientRateLimiter::new();
        for _ in 0..MAX_REQUESTS {
            assert!(limiter.check("1.2.3.4").is_ok());
        }
        assert!(matches!(limiter.check("1.2.3.4"), Err(ApiError::RateLimit)));
    }

    #[test]
    fn distinct_clients_have_independent_quotas() {
        let limiter = ClientRateLimiter::new();
        for _ in 0..MAX_REQUESTS {
            limiter.check("10.0.0.1").unwrap();
        }
        assert!(limiter.check("10.0.0.1").is_err());
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn prefers_x_forwarded_for_then_x_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identity(&headers), "unknown");

        headers.insert("x-real-ip", "9.9.9.9".parse().unwrap());
        assert_eq!(client_identity(&headers), "9.9.9.9");

        headers.insert("x-forwarded-for", "1.1.1.1, 2.2.2.2".parse().unwrap());
        assert_eq!(client_identity(&headers), "1.1.1.1");
    }
}
