//! Member endpoints: profiles, relationships, images and deletion.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, post, put},
};
use borohub_common::AppResult;
use borohub_core::{
    DeletionReport, MemberProfile, MemberSummary, UpdateMemberInput, authorize_member_edit,
};
use serde::{Deserialize, Serialize};

use super::upload::UploadForm;
use crate::{
    extractors::{AdminMember, AuthMember},
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

/// Body of restrict/unrestrict requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionRequest {
    pub restricted_user_id: String,
}

/// A message together with a member profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberData {
    pub message: String,
    pub member_data: MemberProfile,
}

/// A message together with the members it concerns.
#[derive(Serialize)]
pub struct MemberList {
    pub message: String,
    pub members: Vec<MemberSummary>,
}

/// Outcome of a member deletion.
#[derive(Serialize)]
pub struct Deleted {
    pub message: String,
    pub report: DeletionReport,
}

async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberProfile>> {
    let profile = state.member_service.get_profile(&member_id).await?;
    Ok(ApiResponse::ok(profile))
}

async fn update_member(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(input): Json<UpdateMemberInput>,
) -> AppResult<ApiResponse<MemberProfile>> {
    let profile = state.member_service.update(&actor, &member_id, input).await?;
    Ok(ApiResponse::ok(profile))
}

/// The session member follows `member_id`.
async fn follow(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberData>> {
    state.relationship_service.follow(&member_id, &actor.id).await?;
    let profile = state.member_service.get_profile(&member_id).await?;

    Ok(ApiResponse::ok(MemberData {
        message: "You are now connected with this member".to_string(),
        member_data: profile,
    }))
}

async fn unfollow(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberData>> {
    state.relationship_service.unfollow(&member_id, &actor.id).await?;
    let profile = state.member_service.get_profile(&member_id).await?;

    Ok(ApiResponse::ok(MemberData {
        message: "You have successfully unfollowed this member".to_string(),
        member_data: profile,
    }))
}

async fn followers(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberList>> {
    let members = state.relationship_service.followers(&member_id).await?;
    Ok(ApiResponse::ok(MemberList {
        message: "Followers retrieved successfully".to_string(),
        members,
    }))
}

async fn following(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberList>> {
    let members = state.relationship_service.following(&member_id).await?;
    Ok(ApiResponse::ok(MemberList {
        message: "Following retrieved successfully".to_string(),
        members,
    }))
}

async fn restrict(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(req): Json<RestrictionRequest>,
) -> AppResult<ApiResponse<Message>> {
    authorize_member_edit(&actor, &member_id)?;
    state
        .relationship_service
        .restrict(&member_id, &req.restricted_user_id)
        .await?;
    Ok(message("You have successfully restricted this user"))
}

async fn unrestrict(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(req): Json<RestrictionRequest>,
) -> AppResult<ApiResponse<Message>> {
    authorize_member_edit(&actor, &member_id)?;
    state
        .relationship_service
        .unrestrict(&member_id, &req.restricted_user_id)
        .await?;
    Ok(message("You have successfully unrestricted this user"))
}

async fn restricted_list(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<MemberList>> {
    let members = state.relationship_service.restricted(&member_id).await?;
    Ok(ApiResponse::ok(MemberList {
        message: "Restricted members retrieved successfully".to_string(),
        members,
    }))
}

async fn search(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<ApiResponse<MemberList>> {
    let members = state.member_service.search(&handle).await?;
    Ok(ApiResponse::ok(MemberList {
        message: "Members found".to_string(),
        members,
    }))
}

async fn upload_avatar(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<MemberData>> {
    authorize_member_edit(&actor, &member_id)?;

    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_single_file("avatar")?;
    let stored = state
        .media_service
        .store_image("avatars", &member_id, &upload)
        .await?;

    let profile = match state
        .member_service
        .set_avatar(&actor, &member_id, stored.url.clone())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            state.media_service.discard(std::slice::from_ref(&stored)).await;
            return Err(e);
        }
    };

    Ok(ApiResponse::ok(MemberData {
        message: "Avatar uploaded successfully".to_string(),
        member_data: profile,
    }))
}

async fn upload_cover_image(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<MemberData>> {
    authorize_member_edit(&actor, &member_id)?;

    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_single_file("coverImage")?;
    let stored = state
        .media_service
        .store_image("covers", &member_id, &upload)
        .await?;

    let profile = match state
        .member_service
        .set_cover_image(&actor, &member_id, stored.url.clone())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            state.media_service.discard(std::slice::from_ref(&stored)).await;
            return Err(e);
        }
    };

    Ok(ApiResponse::ok(MemberData {
        message: "Cover image uploaded successfully".to_string(),
        member_data: profile,
    }))
}

/// Self-deletion, or deletion by an admin.
async fn delete_member(
    AuthMember(actor): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    let report = state
        .member_deletion_service
        .delete_member(&actor, &member_id)
        .await?;

    Ok(ApiResponse::ok(Deleted {
        message: "Member account deleted successfully".to_string(),
        report,
    }))
}

async fn admin_delete_member(
    AdminMember(admin): AdminMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<Deleted>> {
    let report = state
        .member_deletion_service
        .delete_member(&admin, &member_id)
        .await?;

    Ok(ApiResponse::ok(Deleted {
        message: "Member and associated data deleted successfully".to_string(),
        report,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{member_id}", get(get_member))
        .route("/update/{member_id}", put(update_member))
        .route("/follow/{member_id}", put(follow))
        .route("/unfollow/{member_id}", delete(unfollow))
        .route("/followers/{member_id}", get(followers))
        .route("/following/{member_id}", get(following))
        .route("/restricted/{member_id}", post(restrict))
        .route("/unrestricted/{member_id}", delete(unrestrict))
        .route("/restricting/{member_id}", get(restricted_list))
        .route("/search/{handle}", get(search))
        .route("/avatarUpload/{member_id}", put(upload_avatar))
        .route("/coverImageUpload/{member_id}", put(upload_cover_image))
        .route("/delete/{member_id}", delete(delete_member))
        .route("/admin/delete/{member_id}", delete(admin_delete_member))
}
