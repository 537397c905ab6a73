//! Content post repository.

use std::sync::Arc;

use crate::entities::{ContentPost, PostLike, PostMedia, content_post, post_like, post_media};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, Query},
};

/// Message for a post like that already exists.
pub const ALREADY_LIKED_POST: &str = "You have already liked this post.";

/// Content post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<content_post::Model>> {
        ContentPost::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<content_post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// Posts by an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<content_post::Model>> {
        ContentPost::find()
            .filter(content_post::Column::AuthorId.eq(author_id))
            .order_by_desc(content_post::Column::CreatedAt)
            .order_by_desc(content_post::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of an author's posts, read through `conn`.
    pub async fn find_ids_by_author<C: ConnectionTrait>(
        &self,
        conn: &C,
        author_id: &str,
    ) -> AppResult<Vec<String>> {
        ContentPost::find()
            .select_only()
            .column(content_post::Column::Id)
            .filter(content_post::Column::AuthorId.eq(author_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: content_post::ActiveModel,
    ) -> AppResult<content_post::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: content_post::ActiveModel,
    ) -> AppResult<content_post::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete posts together with their media and likes.
    ///
    /// Comments must be removed first through the comment repository.
    pub async fn delete_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_ids: &[String],
    ) -> AppResult<u64> {
        if post_ids.is_empty() {
            return Ok(0);
        }

        PostLike::delete_many()
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        PostMedia::delete_many()
            .filter(post_media::Column::PostId.is_in(post_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = ContentPost::delete_many()
            .filter(content_post::Column::Id.is_in(post_ids.to_vec()))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    // === Media ===

    /// Media rows of the given posts, in display order.
    pub async fn find_media_for_posts(
        &self,
        post_ids: &[String],
    ) -> AppResult<Vec<post_media::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostMedia::find()
            .filter(post_media::Column::PostId.is_in(post_ids.to_vec()))
            .order_by_asc(post_media::Column::PostId)
            .order_by_asc(post_media::Column::Position)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert media rows.
    pub async fn insert_media<C: ConnectionTrait>(
        &self,
        conn: &C,
        models: Vec<post_media::ActiveModel>,
    ) -> AppResult<()> {
        if models.is_empty() {
            return Ok(());
        }

        PostMedia::insert_many(models)
            .exec_without_returning(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove all media rows of a post.
    pub async fn delete_media<C: ConnectionTrait>(&self, conn: &C, post_id: &str) -> AppResult<()> {
        PostMedia::delete_many()
            .filter(post_media::Column::PostId.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // === Likes ===

    /// Check if a member has liked a post.
    pub async fn is_liked(&self, post_id: &str, member_id: &str) -> AppResult<bool> {
        let like = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::MemberId.eq(member_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(like.is_some())
    }

    /// Like rows of the given posts, oldest first.
    pub async fn find_likes_for_posts(
        &self,
        post_ids: &[String],
    ) -> AppResult<Vec<post_like::Model>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        PostLike::find()
            .filter(post_like::Column::PostId.is_in(post_ids.to_vec()))
            .order_by_asc(post_like::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a like row.
    pub async fn create_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: post_like::ActiveModel,
    ) -> AppResult<post_like::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, ALREADY_LIKED_POST))
    }

    /// Delete a like row. Returns the number of rows removed.
    pub async fn delete_like<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = PostLike::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::MemberId.eq(member_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Increment like count atomically (single UPDATE query, no fetch).
    pub async fn increment_like_count<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
    ) -> AppResult<()> {
        ContentPost::update_many()
            .col_expr(
                content_post::Column::LikeCount,
                Expr::col(content_post::Column::LikeCount).add(1),
            )
            .filter(content_post::Column::Id.eq(post_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement like count atomically, never going below zero.
    pub async fn decrement_like_count<C: ConnectionTrait>(
        &self,
        conn: &C,
        post_id: &str,
    ) -> AppResult<()> {
        ContentPost::update_many()
            .col_expr(
                content_post::Column::LikeCount,
                Expr::col(content_post::Column::LikeCount).sub(1),
            )
            .filter(content_post::Column::Id.eq(post_id))
            .filter(content_post::Column::LikeCount.gt(0))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Withdraw every like a member has given: decrement each liked post's
    /// count, then delete the like rows. Returns the number of likes removed.
    pub async fn remove_likes_by_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        ContentPost::update_many()
            .col_expr(
                content_post::Column::LikeCount,
                Expr::col(content_post::Column::LikeCount).sub(1),
            )
            .filter(
                content_post::Column::Id.in_subquery(
                    Query::select()
                        .column(post_like::Column::PostId)
                        .from(PostLike)
                        .and_where(post_like::Column::MemberId.eq(member_id))
                        .to_owned(),
                ),
            )
            .filter(content_post::Column::LikeCount.gt(0))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = PostLike::delete_many()
            .filter(post_like::Column::MemberId.eq(member_id))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: &str, author_id: &str, like_count: i32) -> content_post::Model {
        content_post::Model {
            id: id.to_string(),
            author_id: author_id.to_string(),
            content: "hello".to_string(),
            like_count,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<content_post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::PostNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_author() {
        let p1 = create_test_post("p2", "member1", 0);
        let p2 = create_test_post("p1", "member1", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let posts = repo.find_by_author("member1").await.unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].like_count, 3);
    }

    #[tokio::test]
    async fn test_increment_like_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db.clone());
        let result = repo.increment_like_count(db.as_ref(), "p1").await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_delete_many_empty_is_noop() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = PostRepository::new(db.clone());
        let removed = repo.delete_many(db.as_ref(), &[]).await.unwrap();

        assert_eq!(removed, 0);
    }
}
