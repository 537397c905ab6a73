//! Member deletion: removes a member and every reference to them.

use std::sync::Arc;

use borohub_common::{AppError, AppResult};
use borohub_db::{
    entities::member,
    repositories::{
        ChatRepository, CommentRepository, FollowRepository, MemberRepository, PostRepository,
        RestrictionRepository,
    },
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;

use super::member::authorize_member_edit;

/// What a member deletion removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub member_id: String,
    /// Likes the member had given on posts, comments and replies.
    pub likes_withdrawn: u64,
    pub replies: u64,
    pub comments: u64,
    pub posts: u64,
    pub follows: u64,
    pub restrictions: u64,
    pub chats: u64,
    pub chat_memberships: u64,
    pub chat_entries: u64,
}

/// Cascading member deletion.
#[derive(Clone)]
pub struct MemberDeletionService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    follow_repo: FollowRepository,
    restriction_repo: RestrictionRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    chat_repo: ChatRepository,
}

impl MemberDeletionService {
    /// Create a new member deletion service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        follow_repo: FollowRepository,
        restriction_repo: RestrictionRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        chat_repo: ChatRepository,
    ) -> Self {
        Self {
            db,
            member_repo,
            follow_repo,
            restriction_repo,
            post_repo,
            comment_repo,
            chat_repo,
        }
    }

    /// Delete a member. The actor must be the member themself or an admin.
    ///
    /// Everything runs in one transaction; on error nothing is removed.
    pub async fn delete_member(
        &self,
        actor: &member::Model,
        member_id: &str,
    ) -> AppResult<DeletionReport> {
        authorize_member_edit(actor, member_id)?;
        self.member_repo.get_by_id(member_id).await?;

        let mut report = DeletionReport {
            member_id: member_id.to_string(),
            ..DeletionReport::default()
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Likes given, with counter decrements.
        report.likes_withdrawn = self.post_repo.remove_likes_by_member(&txn, member_id).await?
            + self.comment_repo.remove_likes_by_member(&txn, member_id).await?;

        report.replies = self
            .comment_repo
            .delete_replies_by_member(&txn, member_id)
            .await?;

        let comment_ids = self.comment_repo.find_ids_by_member(&txn, member_id).await?;
        report.comments = self.comment_repo.delete_many(&txn, &comment_ids).await?;

        // Posts, including other members' comments on them.
        let post_ids = self.post_repo.find_ids_by_author(&txn, member_id).await?;
        let foreign_comment_ids = self.comment_repo.find_ids_by_posts(&txn, &post_ids).await?;
        report.comments += self
            .comment_repo
            .delete_many(&txn, &foreign_comment_ids)
            .await?;
        report.posts = self.post_repo.delete_many(&txn, &post_ids).await?;

        report.follows = self
            .follow_repo
            .delete_all_for_member(&txn, member_id)
            .await?;
        report.restrictions = self
            .restriction_repo
            .delete_all_for_member(&txn, member_id)
            .await?;

        let chat_ids = self.chat_repo.find_ids_by_creator(&txn, member_id).await?;
        report.chats = self.chat_repo.delete_many(&txn, &chat_ids).await?;
        report.chat_memberships = self
            .chat_repo
            .remove_participant_everywhere(&txn, member_id)
            .await?;
        report.chat_entries = self
            .chat_repo
            .delete_entries_by_sender(&txn, member_id)
            .await?;

        let removed = self.member_repo.delete(&txn, member_id).await?;
        if removed == 0 {
            return Err(AppError::MemberNotFound(member_id.to_string()));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            member_id = %member_id,
            actor_id = %actor.id,
            likes_withdrawn = report.likes_withdrawn,
            replies = report.replies,
            comments = report.comments,
            posts = report.posts,
            follows = report.follows,
            restrictions = report.restrictions,
            chats = report.chats,
            chat_entries = report.chat_entries,
            "Member deleted"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use borohub_db::entities::member::MemberRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn test_member(id: &str) -> member::Model {
        member::Model {
            id: id.to_string(),
            full_name: "Test".to_string(),
            handle: id.to_string(),
            handle_lower: id.to_string(),
            email_address: format!("{id}@example.com"),
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
    async fn test_member_cannot_delete_someone_else() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let svc = MemberDeletionService::new(
            Arc::clone(&db),
            MemberRepository::new(Arc::clone(&db)),
            FollowRepository::new(Arc::clone(&db)),
            RestrictionRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
            ChatRepository::new(Arc::clone(&db)),
        );

        assert!(matches!(
            svc.delete_member(&test_member("m1"), "m2").await,
            Err(AppError::Forbidden(_))
        ));
    }
}
