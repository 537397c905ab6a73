//! Follow repository.

use std::sync::Arc;

use crate::entities::{MemberFollow, member_follow};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Message for a follow edge that already exists.
pub const ALREADY_FOLLOWING: &str = "You are already connected with this member";

/// Follow repository for database operations.
#[derive(Clone)]
pub struct FollowRepository {
    db: Arc<DatabaseConnection>,
}

impl FollowRepository {
    /// Create a new follow repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a follow edge by follower and followee.
    pub async fn find_by_pair(
        &self,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<Option<member_follow::Model>> {
        MemberFollow::find()
            .filter(member_follow::Column::FollowerId.eq(follower_id))
            .filter(member_follow::Column::FolloweeId.eq(followee_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a member is following another member.
    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(follower_id, followee_id).await?.is_some())
    }

    /// Create a new follow edge.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member_follow::ActiveModel,
    ) -> AppResult<member_follow::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, ALREADY_FOLLOWING))
    }

    /// Delete a follow edge by pair. Returns the number of rows removed.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        follower_id: &str,
        followee_id: &str,
    ) -> AppResult<u64> {
        let result = MemberFollow::delete_many()
            .filter(member_follow::Column::FollowerId.eq(follower_id))
            .filter(member_follow::Column::FolloweeId.eq(followee_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete every follow edge between two members, in both directions.
    pub async fn delete_between<C: ConnectionTrait>(
        &self,
        conn: &C,
        a: &str,
        b: &str,
    ) -> AppResult<u64> {
        let result = MemberFollow::delete_many()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(member_follow::Column::FollowerId.eq(a))
                            .add(member_follow::Column::FolloweeId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(member_follow::Column::FollowerId.eq(b))
                            .add(member_follow::Column::FolloweeId.eq(a)),
                    ),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete every follow edge touching a member.
    pub async fn delete_all_for_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = MemberFollow::delete_many()
            .filter(
                Condition::any()
                    .add(member_follow::Column::FollowerId.eq(member_id))
                    .add(member_follow::Column::FolloweeId.eq(member_id)),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// IDs of the members following `member_id`, oldest edge first.
    pub async fn find_follower_ids(&self, member_id: &str) -> AppResult<Vec<String>> {
        MemberFollow::find()
            .select_only()
            .column(member_follow::Column::FollowerId)
            .filter(member_follow::Column::FolloweeId.eq(member_id))
            .order_by_asc(member_follow::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the members `member_id` follows, oldest edge first.
    pub async fn find_following_ids(&self, member_id: &str) -> AppResult<Vec<String>> {
        MemberFollow::find()
            .select_only()
            .column(member_follow::Column::FolloweeId)
            .filter(member_follow::Column::FollowerId.eq(member_id))
            .order_by_asc(member_follow::Column::Id)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_follow(id: &str, follower_id: &str, followee_id: &str) -> member_follow::Model {
        member_follow::Model {
            id: id.to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_is_following_true() {
        let follow = create_test_follow("f1", "member1", "member2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[follow]])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(repo.is_following("member1", "member2").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_following_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member_follow::Model>::new()])
                .into_connection(),
        );

        let repo = FollowRepository::new(db);
        assert!(!repo.is_following("member1", "member3").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_by_pair_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = FollowRepository::new(db.clone());
        let removed = repo
            .delete_by_pair(db.as_ref(), "member1", "member2")
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
