//! Authentication session endpoints.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use borohub_common::{AppError, AppResult};
use borohub_core::{AccessAccountInput, InitializeAccountInput, MemberProfile};
use serde::Serialize;

use crate::{
    extractors::AuthMember,
    middleware::{ACCESS_COOKIE, AppState, REFRESH_COOKIE},
    rate_limit::{RateLimiterState, rate_limit_auth_middleware},
    response::{ApiResponse, Message, message},
};

/// A message together with the affected member.
#[derive(Serialize)]
pub struct MemberMessage {
    pub message: String,
    pub member: MemberProfile,
}

fn session_cookie(name: &'static str, value: String, ttl_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::None)
        .path("/")
        .max_age(time::Duration::seconds(ttl_secs))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Register a new member.
async fn initialize_account(
    State(state): State<AppState>,
    Json(input): Json<InitializeAccountInput>,
) -> AppResult<ApiResponse<MemberMessage>> {
    let member = state.member_service.initialize_account(input).await?;
    let profile = state.member_service.profile_of(member).await?;

    Ok(ApiResponse::created(MemberMessage {
        message: "Member account initialized successfully!".to_string(),
        member: profile,
    }))
}

/// Sign in and receive the session cookies.
async fn access_account(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<AccessAccountInput>,
) -> AppResult<(CookieJar, ApiResponse<MemberMessage>)> {
    let member = state.member_service.access_account(&input).await?;
    let tokens = state.token_service.issue(&member)?;

    let jar = jar
        .add(session_cookie(
            ACCESS_COOKIE,
            tokens.access_token,
            tokens.access_ttl_secs,
            state.secure_cookies,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token,
            tokens.refresh_ttl_secs,
            state.secure_cookies,
        ));

    let profile = state.member_service.profile_of(member).await?;
    Ok((
        jar,
        ApiResponse::ok(MemberMessage {
            message: "Member account accessed successfully!".to_string(),
            member: profile,
        }),
    ))
}

/// Sign out by clearing both session cookies.
async fn end_session(
    AuthMember(member): AuthMember,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<Message>)> {
    if jar.get(ACCESS_COOKIE).is_none() {
        return Err(AppError::BadRequest("No session to end".to_string()));
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));

    tracing::info!(member_id = %member.id, "Session ended");
    Ok((jar, message("Member session ended successfully!")))
}

/// The member behind the current session.
async fn get_session(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MemberMessage>> {
    let profile = state.member_service.profile_of(member).await?;

    Ok(ApiResponse::ok(MemberMessage {
        message: "Current member session retrieved successfully!".to_string(),
        member: profile,
    }))
}

/// Exchange the refresh cookie for a new access cookie.
async fn refresh_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<MemberMessage>)> {
    let refresh_token = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("No refresh token provided".to_string()))?;

    let claims = state.token_service.verify_refresh(&refresh_token)?;
    let member = state.member_service.get(&claims.sub).await?;
    let access_token = state.token_service.issue_access(&member)?;

    let jar = jar.add(session_cookie(
        ACCESS_COOKIE,
        access_token,
        state.token_service.access_ttl_secs(),
        state.secure_cookies,
    ));

    tracing::info!(member_id = %member.id, "Session refreshed");
    let profile = state.member_service.profile_of(member).await?;
    Ok((
        jar,
        ApiResponse::ok(MemberMessage {
            message: "Access token refreshed successfully!".to_string(),
            member: profile,
        }),
    ))
}

pub fn router(rate_limiter: RateLimiterState) -> Router<AppState> {
    Router::new()
        .route("/initializeAccount", post(initialize_account))
        .route(
            "/accessAccount",
            post(access_account).layer(middleware::from_fn_with_state(
                rate_limiter,
                rate_limit_auth_middleware,
            )),
        )
        .route("/endSession", get(end_session))
        .route("/getSession", get(get_session))
        .route("/refreshSession", post(refresh_session))
}
