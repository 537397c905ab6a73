//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use borohub_common::{Config, StorageBackend};
use borohub_core::{
    ChatService, CommentService, ContentService, MediaService, MemberDeletionService,
    MemberService, RelationshipService, TokenService,
};
use borohub_db::repositories::{
    ChatRepository, CommentRepository, FollowRepository, MemberRepository, PostRepository,
    RestrictionRepository,
};
use sea_orm::DatabaseConnection;

/// Cookie carrying the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub member_service: MemberService,
    pub relationship_service: RelationshipService,
    pub member_deletion_service: MemberDeletionService,
    pub content_service: ContentService,
    pub comment_service: CommentService,
    pub chat_service: ChatService,
    pub media_service: MediaService,
    pub token_service: TokenService,
    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

impl AppState {
    /// Wire repositories and services over one database connection.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        config: &Config,
    ) -> Self {
        let member_repo = MemberRepository::new(Arc::clone(&db));
        let follow_repo = FollowRepository::new(Arc::clone(&db));
        let restriction_repo = RestrictionRepository::new(Arc::clone(&db));
        let post_repo = PostRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let chat_repo = ChatRepository::new(Arc::clone(&db));

        let member_service = MemberService::new(
            Arc::clone(&db),
            member_repo.clone(),
            follow_repo.clone(),
            restriction_repo.clone(),
            post_repo.clone(),
            &config.auth.admin_emails,
        );
        let relationship_service = RelationshipService::new(
            Arc::clone(&db),
            member_repo.clone(),
            follow_repo.clone(),
            restriction_repo.clone(),
        );
        let content_service = ContentService::new(
            Arc::clone(&db),
            member_repo.clone(),
            post_repo.clone(),
            comment_repo.clone(),
        );
        let comment_service = CommentService::new(
            Arc::clone(&db),
            member_repo.clone(),
            post_repo.clone(),
            comment_repo.clone(),
        );
        let chat_service = ChatService::new(Arc::clone(&db), member_repo.clone(), chat_repo.clone());
        let member_deletion_service = MemberDeletionService::new(
            db,
            member_repo,
            follow_repo,
            restriction_repo,
            post_repo,
            comment_repo,
            chat_repo,
        );

        Self {
            member_service,
            relationship_service,
            member_deletion_service,
            content_service,
            comment_service,
            chat_service,
            media_service: MediaService::new(storage, config.storage.max_file_size),
            token_service: TokenService::new(&config.auth),
            secure_cookies: config.auth.secure_cookies,
        }
    }
}

/// Authentication middleware.
///
/// Reads the access token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header, and attaches the session member to the
/// request. Requests without a valid session pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = session_token(req.headers()) {
        match state.token_service.verify_access(&token) {
            Ok(claims) => match state.member_service.get(&claims.sub).await {
                Ok(member) => {
                    req.extensions_mut().insert(member);
                }
                Err(e) => tracing::debug!(error = %e, "Session member could not be loaded"),
            },
            Err(e) => tracing::debug!(error = %e, "Rejected session token"),
        }
    }

    next.run(req).await
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=from-cookie"),
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_session_token_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(session_token(&headers).as_deref(), Some("from-header"));
        assert_eq!(session_token(&HeaderMap::new()), None);
    }
}
