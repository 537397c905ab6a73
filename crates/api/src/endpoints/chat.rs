//! Chat endpoints. Every route requires a session.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use borohub_common::AppResult;
use borohub_core::{ChatDetails, ChatMessage, CreateChatInput, CreateEntryInput};
use serde::Serialize;

use crate::{
    extractors::AuthMember,
    middleware::AppState,
    response::{ApiResponse, Message, message},
};

/// A message together with the chat.
#[derive(Serialize)]
pub struct ChatData {
    pub message: String,
    pub chat: ChatDetails,
}

/// A message together with the new chat entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryData {
    pub message: String,
    pub chat_entry: ChatMessage,
}

async fn create_chat(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Json(input): Json<CreateChatInput>,
) -> AppResult<ApiResponse<ChatData>> {
    let chat = state.chat_service.create_chat(&member.id, input).await?;
    Ok(ApiResponse::created(ChatData {
        message: "Chat created successfully!".to_string(),
        chat,
    }))
}

async fn create_chat_entry(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(input): Json<CreateEntryInput>,
) -> AppResult<ApiResponse<EntryData>> {
    let entry = state
        .chat_service
        .create_entry(&chat_id, &member.id, input)
        .await?;
    Ok(ApiResponse::created(EntryData {
        message: "Chat entry (message) created successfully!".to_string(),
        chat_entry: entry,
    }))
}

async fn get_chat(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> AppResult<ApiResponse<ChatData>> {
    let chat = state.chat_service.get_chat(&chat_id, &member.id).await?;
    Ok(ApiResponse::ok(ChatData {
        message: "Chat retrieved successfully!".to_string(),
        chat,
    }))
}

async fn delete_chat(
    AuthMember(member): AuthMember,
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.chat_service.delete_chat(&chat_id, &member.id).await?;
    Ok(message("Chat deleted successfully."))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create-chat", post(create_chat))
        .route("/create-chat-entry/{chat_id}", post(create_chat_entry))
        .route("/get-chat/{chat_id}", get(get_chat))
        .route("/delete-chat/{chat_id}", delete(delete_chat))
}
