//! Comment and reply endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use borohub_common::AppResult;
use borohub_core::{CommentThread, CreateCommentInput, ReplyInput, ReplyThread};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthMember,
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

/// Body of a comment edit.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub input: String,
}

/// A message together with the affected comment.
#[derive(Serialize)]
pub struct CommentMessage {
    pub message: String,
    pub comment: CommentThread,
}

/// A message together with the affected reply.
#[derive(Serialize)]
pub struct ReplyMessage {
    pub message: String,
    pub reply: ReplyThread,
}

fn comment_message(text: &str, comment: CommentThread) -> CommentMessage {
    CommentMessage {
        message: text.to_string(),
        comment,
    }
}

fn reply_message(text: &str, reply: ReplyThread) -> ReplyMessage {
    ReplyMessage {
        message: text.to_string(),
        reply,
    }
}

async fn create_comment(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentMessage>> {
    let comment = state.comment_service.create(&member.id, input).await?;
    Ok(ApiResponse::created(comment_message(
        "Comment created successfully!",
        comment,
    )))
}

async fn update_comment(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<UpdateCommentRequest>,
) -> AppResult<ApiResponse<CommentMessage>> {
    let comment = state
        .comment_service
        .update(&comment_id, &member, &req.input)
        .await?;
    Ok(ApiResponse::ok(comment_message(
        "Comment updated successfully!",
        comment,
    )))
}

/// Comments on a post, with their replies.
async fn post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentThread>>> {
    let comments = state.comment_service.list_for_post(&post_id).await?;
    Ok(ApiResponse::ok(comments))
}

async fn comment_reply(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<ReplyInput>,
) -> AppResult<ApiResponse<ReplyMessage>> {
    let reply = state.comment_service.reply(&member.id, input).await?;
    Ok(ApiResponse::created(reply_message(
        "Reply created successfully!",
        reply,
    )))
}

async fn like_comment_reply(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(reply_id): Path<String>,
) -> AppResult<ApiResponse<ReplyMessage>> {
    let reply = state
        .comment_service
        .like_comment_reply(&reply_id, &member.id)
        .await?;
    Ok(ApiResponse::ok(reply_message("Reply liked successfully!", reply)))
}

async fn dislike_comment_reply(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(reply_id): Path<String>,
) -> AppResult<ApiResponse<ReplyMessage>> {
    let reply = state
        .comment_service
        .dislike_comment_reply(&reply_id, &member.id)
        .await?;
    Ok(ApiResponse::ok(reply_message(
        "Reply disliked successfully!",
        reply,
    )))
}

async fn like_comment(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<CommentMessage>> {
    let comment = state
        .comment_service
        .like_comment(&comment_id, &member.id)
        .await?;
    Ok(ApiResponse::ok(comment_message(
        "Comment liked successfully!",
        comment,
    )))
}

async fn dislike_comment(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<CommentMessage>> {
    let comment = state
        .comment_service
        .dislike_comment(&comment_id, &member.id)
        .await?;
    Ok(ApiResponse::ok(comment_message(
        "Comment disliked successfully!",
        comment,
    )))
}

async fn delete_comment(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.comment_service.delete(&comment_id, &member).await?;
    Ok(message("Comment deleted successfully!"))
}

async fn delete_reply(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(reply_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.comment_service.delete_reply(&reply_id, &member).await?;
    Ok(message("Reply deleted successfully!"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-comment", post(create_comment))
        .route("/update-comment/{comment_id}", put(update_comment))
        .route("/post/{post_id}", get(post_comments))
        .route("/comment-reply", post(comment_reply))
        .route("/like-comment-reply/{reply_id}", put(like_comment_reply))
        .route("/dislike-comment-reply/{reply_id}", put(dislike_comment_reply))
        .route("/like-comment/{comment_id}", put(like_comment))
        .route("/dislike-comment/{comment_id}", put(dislike_comment))
        .route("/delete-comment/{comment_id}", delete(delete_comment))
        .route("/delete-reply/{reply_id}", delete(delete_reply))
}
