//! Restriction repository.

use std::sync::Arc;

use crate::entities::{MemberRestriction, member_restriction};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Message for a restriction that already exists.
pub const ALREADY_RESTRICTED: &str = "This user is already restricted";

/// Restriction repository for database operations.
#[derive(Clone)]
pub struct RestrictionRepository {
    db: Arc<DatabaseConnection>,
}

impl RestrictionRepository {
    /// Create a new restriction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a restriction by pair.
    pub async fn find_by_pair(
        &self,
        member_id: &str,
        restricted_id: &str,
    ) -> AppResult<Option<member_restriction::Model>> {
        MemberRestriction::find()
            .filter(member_restriction::Column::MemberId.eq(member_id))
            .filter(member_restriction::Column::RestrictedId.eq(restricted_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if `member_id` has restricted `restricted_id`.
    pub async fn is_restricted(&self, member_id: &str, restricted_id: &str) -> AppResult<bool> {
        Ok(self.find_by_pair(member_id, restricted_id).await?.is_some())
    }

    /// Create a new restriction.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member_restriction::ActiveModel,
    ) -> AppResult<member_restriction::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, ALREADY_RESTRICTED))
    }

    /// Delete a restriction by pair. Returns the number of rows removed.
    pub async fn delete_by_pair<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
        restricted_id: &str,
    ) -> AppResult<u64> {
        let result = MemberRestriction::delete_many()
            .filter(member_restriction::Column::MemberId.eq(member_id))
            .filter(member_restriction::Column::RestrictedId.eq(restricted_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete every restriction a member made or is subject to.
    pub async fn delete_all_for_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        member_id: &str,
    ) -> AppResult<u64> {
        let result = MemberRestriction::delete_many()
            .filter(
                Condition::any()
                    .add(member_restriction::Column::MemberId.eq(member_id))
                    .add(member_restriction::Column::RestrictedId.eq(member_id)),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// IDs on a member's restricted list, oldest first.
    pub async fn find_restricted_ids(&self, member_id: &str) -> AppResult<Vec<String>> {
        MemberRestriction::find()
            .select_only()
            .column(member_restriction::Column::RestrictedId)
            .filter(member_restriction::Column::MemberId.eq(member_id))
            .order_by_asc(member_restriction::Column::Id)
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
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_is_restricted_true() {
        let restriction = member_restriction::Model {
            id: "r1".to_string(),
            member_id: "member1".to_string(),
            restricted_id: "member2".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[restriction]])
                .into_connection(),
        );

        let repo = RestrictionRepository::new(db);
        assert!(repo.is_restricted("member1", "member2").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_restricted_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member_restriction::Model>::new()])
                .into_connection(),
        );

        let repo = RestrictionRepository::new(db);
        assert!(!repo.is_restricted("member2", "member1").await.unwrap());
    }
}
