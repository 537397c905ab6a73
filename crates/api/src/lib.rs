//! HTTP API layer for borohub.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth sessions, members, content posts, comments and chat
//! - **Extractors**: session member and admin checks
//! - **Middleware**: cookie/bearer session authentication, rate limiting
//! - **Response**: the `{ success, data }` envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
pub use rate_limit::{ApiRateLimiter, RateLimitConfig, RateLimiterState};
