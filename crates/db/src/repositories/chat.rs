//! Chat repository.

use std::sync::Arc;

use crate::entities::{Chat, ChatEntry, ChatParticipant, chat, chat_entry, chat_participant};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Query},
};

/// Chat repository for database operations.
#[derive(Clone)]
pub struct ChatRepository {
    db: Arc<DatabaseConnection>,
}

impl ChatRepository {
    /// Create a new chat repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a chat by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<chat::Model>> {
        Chat::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a chat by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<chat::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ChatNotFound(id.to_string()))
    }

    /// Create a new chat.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: chat::ActiveModel,
    ) -> AppResult<chat::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Bump a chat's `updated_at`.
    pub async fn touch<C: ConnectionTrait>(
        &self,
        conn: &C,
        chat_id: &str,
        at: chrono::DateTime<chrono::FixedOffset>,
    ) -> AppResult<()> {
        Chat::update_many()
            .col_expr(chat::Column::UpdatedAt, Expr::value(at))
            .filter(chat::Column::Id.eq(chat_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete chats with their entries and participants.
    pub async fn delete_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        chat_ids: &[String],
    ) -> AppResult<u64> {
        if chat_ids.is_empty() {
            return Ok(0);
        }

        // Replies point at entries of the same chat, so clear them before
        // the rows go away.
        ChatEntry::update_many()
            .col_expr(chat_entry::Column::ReplyToId, Expr::value(Option::<String>::None))
            .filter(chat_entry::Column::ChatId.is_in(chat_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        ChatEntry::delete_many()
            .filter(chat_entry::Column::ChatId.is_in(chat_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        ChatParticipant::delete_many()
            .filter(chat_participant::Column::ChatId.is_in(chat_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Chat::delete_many()
            .filter(chat::Column::Id.is_in(chat_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// IDs of chats a member created, read through `conn`.
    pub async fn find_ids_by_creator<C: ConnectionTrait>(
        &self,
        conn: &C,
        creator_id: &str,
    ) -> AppResult<Vec<String>> {
        Chat::find()
            .select_only()
            .column(chat::Column::Id)
            .filter(chat::Column::CreatorId.eq(creator_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // === Participants ===

    /// Add participants to a chat.
    pub async fn add_participants<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<chat_participant::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        ChatParticipant::insert_many(models)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Participant member IDs of a chat, in join order.
    pub async fn find_participant_ids(&self, chat_id: &str) -> AppResult<Vec<String>> {
        ChatParticipant::find()
            .select_only()
            .column(chat_participant::Column::MemberId)
            .filter(chat_participant::Column::ChatId.eq(chat_id))
            .order_by_asc(chat_participant::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a member participates in a chat.
    pub async fn is_participant(&self, chat_id: &str, member_id: &str) -> AppResult<bool> {
        let participant = ChatParticipant::find()
            .filter(chat_participant::Column::ChatId.eq(chat_id))
            .filter(chat_participant::Column::MemberId.eq(member_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(participant.is_some())
    }

    /// Remove a member from every chat they participate in.
    pub async fn remove_participant_everywhere<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = ChatParticipant::delete_many()
            .filter(chat_participant::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    // === Entries ===

    /// Find an entry by ID.
    pub async fn find_entry_by_id(&self, id: &str) -> AppResult<Option<chat_entry::Model>> {
        ChatEntry::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Entries of a chat, oldest first.
    pub async fn find_entries(&self, chat_id: &str) -> AppResult<Vec<chat_entry::Model>> {
        ChatEntry::find()
            .filter(chat_entry::Column::ChatId.eq(chat_id))
            .order_by_asc(chat_entry::Column::CreatedAt)
            .order_by_asc(chat_entry::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an entry.
    pub async fn create_entry<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: chat_entry::ActiveModel,
    ) -> AppResult<chat_entry::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every entry a member sent. Entries replying to them lose
    /// their `reply_to` reference.
    pub async fn delete_entries_by_sender<C: ConnectionTrait>(
        &self,
        conn: &C,
        sender_id: &str,
    ) -> AppResult<u64> {
        ChatEntry::update_many()
            .col_expr(chat_entry::Column::ReplyToId, Expr::value(Option::<String>::None))
            .filter(
                chat_entry::Column::ReplyToId.in_subquery(
                    Query::select()
                        .column(chat_entry::Column::Id)
                        .from(ChatEntry)
                        .and_where(chat_entry::Column::SenderId.eq(sender_id))
                        .to_owned(),
                ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = ChatEntry::delete_many()
            .filter(chat_entry::Column::SenderId.eq(sender_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<chat::Model>::new()])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::ChatNotFound(_))));
    }

    #[tokio::test]
    async fn test_is_participant() {
        let participant = chat_participant::Model {
            id: "cp1".to_string(),
            chat_id: "chat1".to_string(),
            member_id: "member1".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[participant]])
                .append_query_results([Vec::<chat_participant::Model>::new()])
                .into_connection(),
        );

        let repo = ChatRepository::new(db);
        assert!(repo.is_participant("chat1", "member1").await.unwrap());
        assert!(!repo.is_participant("chat1", "member2").await.unwrap());
    }
}
