//! Content post endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, post, put},
};
use borohub_common::AppResult;
use borohub_core::{
    CreatePostInput, PostDetails, UpdatePostInput, authorize_member_edit, post_content,
};
use serde::Serialize;

use super::upload::UploadForm;
use crate::{
    extractors::AuthMember,
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

/// A message together with the affected post.
#[derive(Serialize)]
pub struct PostMessage {
    pub message: String,
    pub post: PostDetails,
}

/// A message together with a member's posts.
#[derive(Serialize)]
pub struct PostList {
    pub message: String,
    pub posts: Vec<PostDetails>,
}

fn post_message(text: &str, post: PostDetails) -> PostMessage {
    PostMessage {
        message: text.to_string(),
        post,
    }
}

/// Create a post whose media are already hosted.
async fn create_content(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostMessage>> {
    let post = state.content_service.create(&member.id, input).await?;
    Ok(ApiResponse::created(post_message("Post created successfully!", post)))
}

/// Create a post from a multipart form with up to ten images.
async fn create_content_images(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<PostMessage>> {
    authorize_member_edit(&member, &member_id)?;

    let mut form = UploadForm::read(multipart).await?;
    let content = post_content(form.text("content").unwrap_or_default())?;
    let uploads = form.take_files("media");
    let stored = state
        .media_service
        .store_post_images(&member_id, &uploads)
        .await?;

    let media = stored.iter().map(|file| file.url.clone()).collect();
    let post = match state
        .content_service
        .create(&member_id, CreatePostInput { content, media })
        .await
    {
        Ok(post) => post,
        Err(e) => {
            state.media_service.discard(&stored).await;
            return Err(e);
        }
    };
    Ok(ApiResponse::created(post_message("Post created successfully!", post)))
}

async fn update_content(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostMessage>> {
    let post = state.content_service.update(&post_id, &member, input).await?;
    Ok(ApiResponse::ok(post_message("Content updated successfully!", post)))
}

/// Posts by a member, newest first.
async fn get_content(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
) -> AppResult<ApiResponse<PostList>> {
    let posts = state.content_service.list_by_author(&member_id).await?;
    Ok(ApiResponse::ok(PostList {
        message: "Posts retrieved successfully!".to_string(),
        posts,
    }))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostDetails>> {
    let post = state.content_service.get(&post_id).await?;
    Ok(ApiResponse::ok(post))
}

async fn like_content(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostMessage>> {
    let post = state.content_service.like(&post_id, &member.id).await?;
    Ok(ApiResponse::ok(post_message("Post liked successfully!", post)))
}

async fn unlike_content(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostMessage>> {
    let post = state.content_service.unlike(&post_id, &member.id).await?;
    Ok(ApiResponse::ok(post_message("Post unliked successfully!", post)))
}

async fn delete_content(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.content_service.delete(&post_id, &member).await?;
    Ok(message("Content deleted successfully!"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-content", post(create_content))
        .route("/create-content-images/{member_id}", post(create_content_images))
        .route("/update-content/{post_id}", put(update_content))
        .route("/get-content/{member_id}", get(get_content))
        .route("/post/{post_id}", get(get_post))
        .route("/like-content/{post_id}", put(like_content))
        .route("/unlike-content/{post_id}", put(unlike_content))
        .route("/delete-content/{post_id}", delete(delete_content))
}
