//! Per-client-IP rate limiting
//!
//! Each client IP gets a GCRA bucket of `max_requests` spread over
//! `window_secs`. Allowed responses carry `RateLimit-Policy`,
//! `RateLimit-Limit` and `RateLimit-Remaining`; rejected requests get the
//! standard error envelope with status 429 and `Retry-After`.
//!
//! The client IP comes from the socket address (`ConnectInfo`). Proxy
//! headers are only read when `trust_proxy_headers` is set. Requests with
//! neither share the unspecified-address bucket.

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use anyhow::{anyhow, Result};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::StateInformationMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const RATELIMIT_POLICY: HeaderName = HeaderName::from_static("ratelimit-policy");
pub const RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
pub const RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");

type KeyedLimiter = RateLimiter<
    IpAddr,
    DefaultKeyedStateStore<IpAddr>,
    DefaultClock,
    StateInformationMiddleware,
>;

/// Rate limiter keyed by client IP
pub struct IpRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    max_requests: u32,
    policy: HeaderValue,
    trust_proxy_headers: bool,
}

impl IpRateLimiter {
    /// Build the limiter, or `None` when rate limiting is switched off
    pub fn from_config(config: &RateLimitConfig) -> Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let burst = NonZeroU32::new(config.max_requests)
            .ok_or_else(|| anyhow!("rate_limit.max_requests must be positive"))?;
        let period = Duration::from_secs(config.window_secs) / config.max_requests;
        let quota = Quota::with_period(period)
            .ok_or_else(|| anyhow!("rate_limit.window_secs must be positive"))?
            .allow_burst(burst);

        let policy =
            HeaderValue::from_str(&format!("{};w={}", config.max_requests, config.window_secs))?;

        Ok(Some(Self {
            limiter: RateLimiter::keyed(quota).with_middleware::<StateInformationMiddleware>(),
            clock: DefaultClock::default(),
            max_requests: config.max_requests,
            policy,
            trust_proxy_headers: config.trust_proxy_headers,
        }))
    }

    /// Take one request from the IP's bucket
    ///
    /// Returns the remaining requests, or the seconds until the next one is allowed.
    pub fn check(&self, ip: IpAddr) -> Result<u32, u64> {
        match self.limiter.check_key(&ip) {
            Ok(snapshot) => Ok(snapshot.remaining_burst_capacity()),
            Err(not_until) => {
                let wait = not_until.wait_time_from(self.clock.now());
                Err(wait.as_millis().div_ceil(1000).max(1) as u64)
            }
        }
    }

    /// Drop buckets that have refilled completely
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!(tracked = self.limiter.len(), "Pruned rate limiter state");
    }

    /// Resolve the IP a request is accounted to
    pub fn client_ip(&self, req: &Request) -> IpAddr {
        if self.trust_proxy_headers {
            if let Some(ip) = forwarded_ip(req.headers()) {
                return ip;
            }
        }
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    fn apply_headers(&self, headers: &mut HeaderMap, remaining: u32) {
        headers.insert(RATELIMIT_POLICY, self.policy.clone());
        headers.insert(RATELIMIT_LIMIT, HeaderValue::from(self.max_requests));
        headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    }
}

/// Rightmost `X-Forwarded-For` entry, then `X-Real-IP`
fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let from_forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    from_forwarded.or_else(|| {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    })
}

/// Axum middleware enforcing the per-IP limit
pub async fn rate_limit(
    State(limiter): State<Arc<IpRateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let ip = limiter.client_ip(&req);

    match limiter.check(ip) {
        Ok(remaining) => {
            let mut response = next.run(req).await;
            limiter.apply_headers(response.headers_mut(), remaining);
            response
        }
        Err(retry_after_secs) => {
            warn!(%ip, retry_after_secs, "Rate limit exceeded");
            let mut response = ApiError::RateLimited { retry_after_secs }.into_response();
            limiter.apply_headers(response.headers_mut(), 0);
            response
        }
    }
}
