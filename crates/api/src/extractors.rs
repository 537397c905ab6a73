//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use borohub_common::AppError;
use borohub_db::entities::member;

/// Authenticated member extractor.
#[derive(Debug, Clone)]
pub struct AuthMember(pub member::Model);

impl<S> FromRequestParts<S> for AuthMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<member::Model>()
            .cloned()
            .map(AuthMember)
            .ok_or_else(|| AppError::Unauthorized("You must be signed in".to_string()))
    }
}

/// Authenticated admin extractor.
#[derive(Debug, Clone)]
pub struct AdminMember(pub member::Model);

impl<S> FromRequestParts<S> for AdminMember
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthMember(member) = AuthMember::from_request_parts(parts, state).await?;
        if !member.is_admin() {
            return Err(AppError::Forbidden("Admin privileges required".to_string()));
        }
        Ok(Self(member))
    }
}
