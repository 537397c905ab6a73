//! API endpoints.

mod auth;
mod chat;
mod comment;
mod content;
mod member;
mod upload;

use axum::Router;

use crate::middleware::AppState;
use crate::rate_limit::RateLimiterState;

/// Create the API router.
///
/// `rate_limiter` backs the sign-in limit; the general limit is layered by
/// the server around the whole router.
pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router(rate_limiter))
        .nest("/member", member::router())
        .nest("/content", content::router())
        .nest("/comment", comment::router())
        .nest("/chat", chat::router())
}
