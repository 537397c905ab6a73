//! Comment repository (comments, replies and their likes).

use std::sync::Arc;

use crate::entities::{
    Comment, CommentLike, CommentReply, ReplyLike, comment, comment_like, comment_reply,
    reply_like,
};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Query},
};

/// Message for a comment like that already exists.
pub const ALREADY_LIKED_COMMENT: &str = "You have already liked this comment.";

/// Message for a reply like that already exists.
pub const ALREADY_LIKED_REPLY: &str = "You have already liked this reply.";

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // === Comments ===

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Comments on a post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on any of the given posts, oldest first.
    pub async fn find_by_posts(&self, post_ids: &[String]) -> AppResult<Vec<comment::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of comments on any of the given posts, read through `conn`.
    pub async fn find_ids_by_posts<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_ids: &[String],
    ) -> AppResult<Vec<String>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::PostId.is_in(post_ids.to_vec()))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of comments written by a member, read through `conn`.
    pub async fn find_ids_by_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<Vec<String>> {
        Comment::find()
            .select_only()
            .column(comment::Column::Id)
            .filter(comment::Column::MemberId.eq(member_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new comment.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a comment.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete comments together with their likes, replies and reply likes.
    pub async fn delete_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        comment_ids: &[String],
    ) -> AppResult<u64> {
        if comment_ids.is_empty() {
            return Ok(0);
        }

        ReplyLike::delete_many()
            .filter(
                reply_like::Column::ReplyId.in_subquery(
                    Query::select()
                        .column(comment_reply::Column::Id)
                        .from(CommentReply)
                        .and_where(comment_reply::Column::CommentId.is_in(comment_ids.to_vec()))
                        .to_owned(),
                ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        CommentReply::delete_many()
            .filter(comment_reply::Column::CommentId.is_in(comment_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        CommentLike::delete_many()
            .filter(comment_like::Column::CommentId.is_in(comment_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Comment::delete_many()
            .filter(comment::Column::Id.is_in(comment_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    // === Comment likes ===

    /// Check if a member has liked a comment.
    pub async fn is_comment_liked(&self, comment_id: &str, member_id: &str) -> AppResult<bool> {
        let like = CommentLike::find()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .filter(comment_like::Column::MemberId.eq(member_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(like.is_some())
    }

    /// Like rows of the given comments, oldest first.
    pub async fn find_likes_for_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<comment_like::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        CommentLike::find()
            .filter(comment_like::Column::CommentId.is_in(comment_ids.to_vec()))
            .order_by_asc(comment_like::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a comment like.
    pub async fn create_comment_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment_like::ActiveModel,
    ) -> AppResult<comment_like::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, ALREADY_LIKED_COMMENT))
    }

    /// Delete a comment like. Returns the number of rows removed.
    pub async fn delete_comment_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        comment_id: &str,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = CommentLike::delete_many()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .filter(comment_like::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Add `delta` (+1 or -1) to a comment's like count, never below zero.
    pub async fn adjust_comment_like_count<C: ConnectionTrait>(
        &self,
        conn: &C,
        comment_id: &str,
        delta: i32,
    ) -> AppResult<()> {
        let mut update = Comment::update_many()
            .col_expr(
                comment::Column::LikeCount,
                Expr::col(comment::Column::LikeCount).add(delta),
            )
            .filter(comment::Column::Id.eq(comment_id));
        if delta < 0 {
            update = update.filter(comment::Column::LikeCount.gte(-delta));
        }

        update
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // === Replies ===

    /// Find a reply by ID.
    pub async fn find_reply_by_id(&self, id: &str) -> AppResult<Option<comment_reply::Model>> {
        CommentReply::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reply by ID, returning an error if not found.
    pub async fn get_reply_by_id(&self, id: &str) -> AppResult<comment_reply::Model> {
        self.find_reply_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reply not found: {id}")))
    }

    /// Replies under the given comments, in reply order.
    pub async fn find_replies_for_comments(
        &self,
        comment_ids: &[String],
    ) -> AppResult<Vec<comment_reply::Model>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        CommentReply::find()
            .filter(comment_reply::Column::CommentId.is_in(comment_ids.to_vec()))
            .order_by_asc(comment_reply::Column::CreatedAt)
            .order_by_asc(comment_reply::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reply.
    pub async fn create_reply<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: comment_reply::ActiveModel,
    ) -> AppResult<comment_reply::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a single reply with its likes.
    pub async fn delete_reply<C: ConnectionTrait>(&self, conn: &C, reply_id: &str) -> AppResult<u64> {
        ReplyLike::delete_many()
            .filter(reply_like::Column::ReplyId.eq(reply_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = CommentReply::delete_by_id(reply_id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete every reply written by a member, with the likes on them.
    pub async fn delete_replies_by_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        ReplyLike::delete_many()
            .filter(
                reply_like::Column::ReplyId.in_subquery(
                    Query::select()
                        .column(comment_reply::Column::Id)
                        .from(CommentReply)
                        .and_where(comment_reply::Column::MemberId.eq(member_id))
                        .to_owned(),
                ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = CommentReply::delete_many()
            .filter(comment_reply::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    // === Reply likes ===

    /// Check if a member has liked a reply.
    pub async fn is_reply_liked(&self, reply_id: &str, member_id: &str) -> AppResult<bool> {
        let like = ReplyLike::find()
            .filter(reply_like::Column::ReplyId.eq(reply_id))
            .filter(reply_like::Column::MemberId.eq(member_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(like.is_some())
    }

    /// Like rows of the given replies, oldest first.
    pub async fn find_likes_for_replies(
        &self,
        reply_ids: &[String],
    ) -> AppResult<Vec<reply_like::Model>> {
        if reply_ids.is_empty() {
            return Ok(vec![]);
        }

        ReplyLike::find()
            .filter(reply_like::Column::ReplyId.is_in(reply_ids.to_vec()))
            .order_by_asc(reply_like::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a reply like.
    pub async fn create_reply_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: reply_like::ActiveModel,
    ) -> AppResult<reply_like::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, ALREADY_LIKED_REPLY))
    }

    /// Delete a reply like. Returns the number of rows removed.
    pub async fn delete_reply_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        reply_id: &str,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = ReplyLike::delete_many()
            .filter(reply_like::Column::ReplyId.eq(reply_id))
            .filter(reply_like::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Add `delta` (+1 or -1) to a reply's like count, never below zero.
    pub async fn adjust_reply_like_count<C: ConnectionTrait>(
        &self,
        conn: &C,
        reply_id: &str,
        delta: i32,
    ) -> AppResult<()> {
        let mut update = CommentReply::update_many()
            .col_expr(
                comment_reply::Column::LikeCount,
                Expr::col(comment_reply::Column::LikeCount).add(delta),
            )
            .filter(comment_reply::Column::Id.eq(reply_id));
        if delta < 0 {
            update = update.filter(comment_reply::Column::LikeCount.gte(-delta));
        }

        update
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Withdraw every comment and reply like a member has given, decrementing
    /// the affected counters. Returns the number of likes removed.
    pub async fn remove_likes_by_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        Comment::update_many()
            .col_expr(
                comment::Column::LikeCount,
                Expr::col(comment::Column::LikeCount).sub(1),
            )
            .filter(
                comment::Column::Id.in_subquery(
                    Query::select()
                        .column(comment_like::Column::CommentId)
                        .from(CommentLike)
                        .and_where(comment_like::Column::MemberId.eq(member_id))
                        .to_owned(),
                ),
            )
            .filter(comment::Column::LikeCount.gt(0))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comment_likes = CommentLike::delete_many()
            .filter(comment_like::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        CommentReply::update_many()
            .col_expr(
                comment_reply::Column::LikeCount,
                Expr::col(comment_reply::Column::LikeCount).sub(1),
            )
            .filter(
                comment_reply::Column::Id.in_subquery(
                    Query::select()
                        .column(reply_like::Column::ReplyId)
                        .from(ReplyLike)
                        .and_where(reply_like::Column::MemberId.eq(member_id))
                        .to_owned(),
                ),
            )
            .filter(comment_reply::Column::LikeCount.gt(0))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let reply_likes = ReplyLike::delete_many()
            .filter(reply_like::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(comment_likes.rows_affected + reply_likes.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_reply(id: &str, comment_id: &str) -> comment_reply::Model {
        comment_reply::Model {
            id: id.to_string(),
            comment_id: comment_id.to_string(),
            member_id: "member1".to_string(),
            input: "reply".to_string(),
            like_count: 0,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_get_reply_by_id_found() {
        let reply = create_test_reply("r1", "c1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[reply]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let found = repo.get_reply_by_id("r1").await.unwrap();

        assert_eq!(found.comment_id, "c1");
    }

    #[tokio::test]
    async fn test_find_replies_for_no_comments() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CommentRepository::new(db);
        let replies = repo.find_replies_for_comments(&[]).await.unwrap();

        assert!(replies.is_empty());
    }
}
