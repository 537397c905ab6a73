//! Chat service: direct and group conversations between members.

use std::collections::HashMap;
use std::sync::Arc;

use borohub_common::{AppError, AppResult, IdGenerator};
use borohub_db::{
    entities::{chat, chat_entry, chat_participant},
    repositories::{ChatRepository, MemberRepository},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::member::MemberSummary;
use super::order_members_by_ids;

/// Input for starting a chat.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatInput {
    #[serde(default)]
    pub participants_id: Vec<String>,
}

/// Input for posting a message to a chat.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryInput {
    #[serde(default)]
    pub content: String,
    pub reply_to: Option<String>,
}

/// A chat message as shown to participants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_handle: Option<String>,
    pub content: String,
    pub reply_to: Option<String>,
    pub created_at: String,
}

/// A chat with its participants and messages, oldest message first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatDetails {
    pub id: String,
    pub creator_id: String,
    pub participants: Vec<MemberSummary>,
    pub messages: Vec<ChatMessage>,
    pub created_at: String,
    pub updated_at: String,
}

/// Chat service for business logic.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    chat_repo: ChatRepository,
    id_gen: IdGenerator,
}

impl ChatService {
    /// Create a new chat service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        chat_repo: ChatRepository,
    ) -> Self {
        Self {
            db,
            member_repo,
            chat_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Start a chat. The creator always joins it.
    pub async fn create_chat(
        &self,
        creator_id: &str,
        input: CreateChatInput,
    ) -> AppResult<ChatDetails> {
        let mut participant_ids: Vec<String> = Vec::new();
        for id in input.participants_id.iter().map(|id| id.trim()) {
            if !id.is_empty() && !participant_ids.iter().any(|p| p == id) {
                participant_ids.push(id.to_string());
            }
        }
        if participant_ids.is_empty() {
            return Err(AppError::BadRequest(
                "At least one participant is required".to_string(),
            ));
        }
        if !participant_ids.iter().any(|p| p == creator_id) {
            participant_ids.insert(0, creator_id.to_string());
        }

        let members = self.member_repo.find_by_ids(&participant_ids).await?;
        if let Some(missing) = participant_ids
            .iter()
            .find(|id| !members.iter().any(|m| &m.id == *id))
        {
            return Err(AppError::MemberNotFound(missing.clone()));
        }

        let chat_id = self.id_gen.generate();
        let now = Utc::now();
        let chat_model = chat::ActiveModel {
            id: Set(chat_id.clone()),
            creator_id: Set(creator_id.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let participant_models = participant_ids
            .iter()
            .map(|member_id| chat_participant::ActiveModel {
                id: Set(self.id_gen.generate()),
                chat_id: Set(chat_id.clone()),
                member_id: Set(member_id.clone()),
                created_at: Set(now.into()),
            })
            .collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.chat_repo.create(&txn, chat_model).await?;
        self.chat_repo
            .add_participants(&txn, participant_models)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            chat_id = %chat_id,
            creator_id = %creator_id,
            participants = participant_ids.len(),
            "Chat created"
        );

        self.get_chat(&chat_id, creator_id).await
    }

    /// Post a message to a chat. Only participants may do so.
    pub async fn create_entry(
        &self,
        chat_id: &str,
        sender_id: &str,
        input: CreateEntryInput,
    ) -> AppResult<ChatMessage> {
        self.chat_repo.get_by_id(chat_id).await?;
        self.ensure_participant(chat_id, sender_id).await?;

        let content = input.content.trim().to_string();
        if content.is_empty() {
            return Err(AppError::BadRequest(
                "Message content is required".to_string(),
            ));
        }

        let reply_to = match input.reply_to.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => {
                let target = self.chat_repo.find_entry_by_id(id).await?;
                if !target.is_some_and(|entry| entry.chat_id == chat_id) {
                    return Err(AppError::BadRequest(
                        "Reply target is not part of this chat".to_string(),
                    ));
                }
                Some(id.to_string())
            }
            _ => None,
        };

        let now = Utc::now();
        let model = chat_entry::ActiveModel {
            id: Set(self.id_gen.generate()),
            chat_id: Set(chat_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            content: Set(content),
            reply_to_id: Set(reply_to),
            created_at: Set(now.into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let entry = self.chat_repo.create_entry(&txn, model).await?;
        self.chat_repo.touch(&txn, chat_id, now.into()).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(chat_id = %chat_id, entry_id = %entry.id, sender_id = %sender_id, "Chat entry created");

        let sender_handle = self
            .member_repo
            .find_by_id(sender_id)
            .await?
            .map(|m| m.handle);
        Ok(ChatMessage::from_entry(entry, sender_handle))
    }

    /// Read a chat. Only participants may do so.
    pub async fn get_chat(&self, chat_id: &str, viewer_id: &str) -> AppResult<ChatDetails> {
        let chat = self.chat_repo.get_by_id(chat_id).await?;
        let participant_ids = self.chat_repo.find_participant_ids(chat_id).await?;
        if !participant_ids.iter().any(|id| id == viewer_id) {
            return Err(not_a_participant());
        }

        let entries = self.chat_repo.find_entries(chat_id).await?;

        let mut member_ids = participant_ids.clone();
        for entry in &entries {
            if !member_ids.contains(&entry.sender_id) {
                member_ids.push(entry.sender_id.clone());
            }
        }
        let members = self.member_repo.find_by_ids(&member_ids).await?;
        let handles: HashMap<&str, &str> = members
            .iter()
            .map(|m| (m.id.as_str(), m.handle.as_str()))
            .collect();

        let messages = entries
            .into_iter()
            .map(|entry| {
                let handle = handles.get(entry.sender_id.as_str()).map(|h| (*h).to_string());
                ChatMessage::from_entry(entry, handle)
            })
            .collect();

        let participants = order_members_by_ids(&participant_ids, members)
            .iter()
            .map(MemberSummary::from)
            .collect();

        tracing::debug!(chat_id = %chat_id, viewer_id = %viewer_id, "Chat read");

        Ok(ChatDetails {
            id: chat.id,
            creator_id: chat.creator_id,
            participants,
            messages,
            created_at: chat.created_at.to_rfc3339(),
            updated_at: chat.updated_at.to_rfc3339(),
        })
    }

    /// Delete a chat with its messages. Only participants may do so.
    pub async fn delete_chat(&self, chat_id: &str, actor_id: &str) -> AppResult<()> {
        self.chat_repo.get_by_id(chat_id).await?;
        self.ensure_participant(chat_id, actor_id).await?;

        let ids = vec![chat_id.to_string()];
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.chat_repo.delete_many(&txn, &ids).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(chat_id = %chat_id, actor_id = %actor_id, "Chat deleted");
        Ok(())
    }

    async fn ensure_participant(&self, chat_id: &str, member_id: &str) -> AppResult<()> {
        if self.chat_repo.is_participant(chat_id, member_id).await? {
            Ok(())
        } else {
            Err(not_a_participant())
        }
    }
}

impl ChatMessage {
    fn from_entry(entry: chat_entry::Model, sender_handle: Option<String>) -> Self {
        Self {
            id: entry.id,
            sender_id: entry.sender_id,
            sender_handle,
            content: entry.content,
            reply_to: entry.reply_to_id,
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

fn not_a_participant() -> AppError {
    AppError::Forbidden("You are not a participant of this chat".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_chat(id: &str, creator_id: &str) -> chat::Model {
        chat::Model {
            id: id.to_string(),
            creator_id: creator_id.to_string(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> ChatService {
        let db = Arc::new(db);
        ChatService::new(
            Arc::clone(&db),
            MemberRepository::new(Arc::clone(&db)),
            ChatRepository::new(Arc::clone(&db)),
        )
    }

    #[tokio::test]
    async fn test_create_chat_requires_participants() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let input = CreateChatInput {
            participants_id: vec![" ".to_string()],
        };

        match svc.create_chat("m1", input).await {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("participant")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_entry_in_missing_chat() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<chat::Model>::new()])
            .into_connection();
        let svc = service(db);

        assert!(matches!(
            svc.create_entry("ghost", "m1", CreateEntryInput::default())
                .await,
            Err(AppError::ChatNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_entry_by_outsider_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_chat("c1", "m1")]])
            .append_query_results([Vec::<chat_participant::Model>::new()])
            .into_connection();
        let svc = service(db);
        let input = CreateEntryInput {
            content: "hi".to_string(),
            reply_to: None,
        };

        assert!(matches!(
            svc.create_entry("c1", "m9", input).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
