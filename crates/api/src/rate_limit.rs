//! Request rate limiting.
//!
//! Each [`ApiRateLimiter`] owns one fixed-window budget. The general budget is
//! keyed by session member, falling back to the client IP. Sign-in has its
//! own, much smaller budget that is always keyed by IP so that guessing
//! passwords for many handles from one address is still throttled.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use borohub_common::AppError;
use borohub_db::entities::member;
use tokio::sync::Mutex;

/// A request budget: `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RateLimitConfig {
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }

    const fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

pub mod limits {
    use super::RateLimitConfig;

    /// Every API request.
    pub const STANDARD: RateLimitConfig = RateLimitConfig::new(300, 60);

    /// Sign-in attempts: 5 per 5 minutes.
    pub const AUTH: RateLimitConfig = RateLimitConfig::new(5, 300);
}

/// Outcome of [`ApiRateLimiter::hit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow {
        limit: u32,
        remaining: u32,
        /// Seconds until the window resets.
        reset_secs: u64,
    },
    Deny {
        retry_after_secs: u64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    used: u32,
}

/// In-memory fixed-window limiter for one budget.
#[derive(Clone)]
pub struct ApiRateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl ApiRateLimiter {
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::default(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Count one request against `key`.
    pub async fn hit(&self, key: &str) -> Decision {
        self.hit_at(key, Instant::now()).await
    }

    async fn hit_at(&self, key: &str, now: Instant) -> Decision {
        let span = self.config.window();
        let mut windows = self.windows.lock().await;
        let window = windows.entry(key.to_string()).or_insert(Window {
            opened: now,
            used: 0,
        });

        if now.saturating_duration_since(window.opened) >= span {
            *window = Window {
                opened: now,
                used: 0,
            };
        }

        let reset_secs = span
            .saturating_sub(now.saturating_duration_since(window.opened))
            .as_secs();

        if window.used >= self.config.max_requests {
            return Decision::Deny {
                retry_after_secs: reset_secs.max(1),
            };
        }

        window.used += 1;
        Decision::Allow {
            limit: self.config.max_requests,
            remaining: self.config.max_requests - window.used,
            reset_secs,
        }
    }

    /// Forget windows that have already closed. Returns how many were dropped.
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Instant::now()).await
    }

    async fn cleanup_at(&self, now: Instant) -> usize {
        let span = self.config.window();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| now.saturating_duration_since(window.opened) < span);
        before - windows.len()
    }
}

/// The limiters shared by the rate-limit middlewares.
#[derive(Clone)]
pub struct RateLimiterState {
    pub standard: ApiRateLimiter,
    pub auth: ApiRateLimiter,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self {
            standard: ApiRateLimiter::new(limits::STANDARD),
            auth: ApiRateLimiter::new(limits::AUTH),
        }
    }
}

impl RateLimiterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop closed windows in both limiters.
    pub async fn cleanup(&self) {
        let dropped = self.standard.cleanup().await + self.auth.cleanup().await;
        if dropped > 0 {
            tracing::debug!(dropped, "Dropped expired rate limit windows");
        }
    }
}

/// 429 response carrying `Retry-After`.
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after_secs: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut response = AppError::RateLimited.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(self.retry_after_secs));
        response
    }
}

/// Client IP: first `X-Forwarded-For` hop, then `X-Real-IP`, then the socket.
fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    let header_ip = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .and_then(|value| value.trim().parse::<IpAddr>().ok())
    };

    header_ip("x-forwarded-for")
        .or_else(|| header_ip("x-real-ip"))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

fn ip_key(req: &Request<Body>) -> String {
    client_ip(req).map_or_else(|| "ip:unknown".to_string(), |ip| format!("ip:{ip}"))
}

fn member_or_ip_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<member::Model>()
        .map_or_else(|| ip_key(req), |member| format!("member:{}", member.id))
}

/// General limit for every API request.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    let key = member_or_ip_key(&req);
    enforce(&limiter.standard, key, req, next).await
}

/// Sign-in limit, keyed by client IP.
pub async fn rate_limit_auth_middleware(
    State(limiter): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    let key = ip_key(&req);
    enforce(&limiter.auth, key, req, next).await
}

async fn enforce(
    limiter: &ApiRateLimiter,
    key: String,
    req: Request<Body>,
    next: Next,
) -> Result<Response, RateLimitError> {
    match limiter.hit(&key).await {
        Decision::Allow {
            limit,
            remaining,
            reset_secs,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", limit.into());
            headers.insert("X-RateLimit-Remaining", remaining.into());
            headers.insert("X-RateLimit-Reset", reset_secs.into());
            Ok(response)
        }
        Decision::Deny { retry_after_secs } => {
            tracing::warn!(key = %key, retry_after_secs, "Rate limit exceeded");
            Err(RateLimitError { retry_after_secs })
        }
    }
}
