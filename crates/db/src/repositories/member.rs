//! Member repository.

use std::sync::Arc;

use crate::entities::{Member, member};
use borohub_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, LikeExpr},
};

/// Member repository for database operations.
#[derive(Clone)]
pub struct MemberRepository {
    db: Arc<DatabaseConnection>,
}

impl MemberRepository {
    /// Create a new member repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a member by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<member::Model>> {
        Member::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<member::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::MemberNotFound(id.to_string()))
    }

    /// Find members by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<member::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Member::find()
            .filter(member::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by email address (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::EmailAddress.eq(email.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a member by handle (case-insensitive).
    pub async fn find_by_handle(&self, handle: &str) -> AppResult<Option<member::Model>> {
        Member::find()
            .filter(member::Column::HandleLower.eq(handle.trim().to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Search members whose handle or full name starts with `prefix`,
    /// ignoring case.
    pub async fn search_by_prefix(
        &self,
        prefix: &str,
        limit: u64,
    ) -> AppResult<Vec<member::Model>> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));

        Member::find()
            .filter(
                Condition::any()
                    .add(
                        member::Column::HandleLower
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(member::Column::FullName)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            )
            .order_by_asc(member::Column::HandleLower)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new member.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member::ActiveModel,
    ) -> AppResult<member::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| crate::map_unique_err(e, "Email address or handle is already taken"))
    }

    /// Update a member.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: member::ActiveModel,
    ) -> AppResult<member::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a member row. Dependent rows must already be gone.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<u64> {
        let result = Member::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}

/// Escape `LIKE` wildcards so user input only matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::member::MemberRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_member(id: &str, handle: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            full_name: format!("{handle} Fullname"),
            handle: handle.to_string(),
            handle_lower: handle.to_lowercase(),
            email_address: format!("{}@example.com", handle.to_lowercase()),
            password_hash: "hash".to_string(),
            role: MemberRole::Member,
            about_me: None,
            location: None,
            hobby: None,
            avatar: String::new(),
            cover_image: String::new(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_get_by_id_found() {
        let member = create_test_member("m1", "Alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[member.clone()]])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let found = repo.get_by_id("m1").await.unwrap();

        assert_eq!(found.handle, "Alice");
        assert!(!found.is_admin());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<member::Model>::new()])
                .into_connection(),
        );

        let repo = MemberRepository::new(db);
        let result = repo.get_by_id("missing").await;

        assert!(matches!(result, Err(AppError::MemberNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = MemberRepository::new(db);
        let result = repo.find_by_ids(&[]).await.unwrap();

        assert!(result.is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("a_b%c"), "a\\_b\\%c");
        assert_eq!(escape_like("plain"), "plain");
    }
}
