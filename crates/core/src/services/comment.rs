//! Comment service: comments, replies and their likes.

use std::collections::HashMap;
use std::sync::Arc;

use borohub_common::{AppError, AppResult, IdGenerator};
use borohub_db::{
    entities::{comment, comment_like, comment_reply, member, reply_like},
    repositories::{
        ALREADY_LIKED_COMMENT, ALREADY_LIKED_REPLY, CommentRepository, MemberRepository,
        PostRepository,
    },
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

/// Input for commenting on a post.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub post_id: String,
    #[serde(default)]
    pub input: String,
}

/// Input for replying to a comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyInput {
    pub comment_id: String,
    #[serde(default)]
    pub input: String,
}

/// A reply with its likers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyThread {
    pub id: String,
    pub comment_id: String,
    pub member_id: String,
    pub input: String,
    pub likes: Vec<String>,
    pub like_count: i32,
    pub created_at: String,
}

/// A comment with its likers and replies.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub id: String,
    pub member_id: String,
    pub post_id: String,
    pub input: String,
    pub likes: Vec<String>,
    pub like_count: i32,
    pub replies: Vec<ReplyThread>,
    pub created_at: String,
    pub updated_at: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            db,
            member_repo,
            post_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post.
    pub async fn create(
        &self,
        member_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<CommentThread> {
        let text = required_input(&input.input, "Comment input is required")?;

        self.post_repo.get_by_id(&input.post_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        let now = Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            post_id: Set(input.post_id.clone()),
            input: Set(text),
            like_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = self.comment_repo.create(self.db.as_ref(), model).await?;
        tracing::info!(comment_id = %created.id, post_id = %created.post_id, "Comment created");

        Ok(CommentThread::from_parts(created, vec![], vec![]))
    }

    /// Edit a comment. Only its author may do so.
    pub async fn update(
        &self,
        comment_id: &str,
        actor: &member::Model,
        input: &str,
    ) -> AppResult<CommentThread> {
        let text = required_input(input, "Comment input is required")?;

        let comment = self.comment_repo.get_by_id(comment_id).await?;
        if comment.member_id != actor.id {
            return Err(AppError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }

        let mut active: comment::ActiveModel = comment.into();
        active.input = Set(text);
        active.updated_at = Set(Utc::now().into());
        self.comment_repo.update(self.db.as_ref(), active).await?;

        tracing::info!(comment_id = %comment_id, "Comment updated");
        self.thread(comment_id).await
    }

    /// Comments on a post, oldest first, with replies and likers.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentThread>> {
        self.post_repo.get_by_id(post_id).await?;
        let comments = self.comment_repo.find_by_post(post_id).await?;
        tracing::debug!(post_id = %post_id, count = comments.len(), "Listing comments");
        self.threads(comments).await
    }

    /// Get one comment with its replies and likers.
    pub async fn thread(&self, comment_id: &str) -> AppResult<CommentThread> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        self.threads(vec![comment])
            .await?
            .pop()
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))
    }

    /// Reply to a comment.
    pub async fn reply(&self, member_id: &str, input: ReplyInput) -> AppResult<ReplyThread> {
        let text = required_input(&input.input, "Reply input is required")?;

        self.comment_repo.get_by_id(&input.comment_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        let model = comment_reply::ActiveModel {
            id: Set(self.id_gen.generate()),
            comment_id: Set(input.comment_id.clone()),
            member_id: Set(member_id.to_string()),
            input: Set(text),
            like_count: Set(0),
            created_at: Set(Utc::now().into()),
        };

        let created = self.comment_repo.create_reply(self.db.as_ref(), model).await?;
        tracing::info!(reply_id = %created.id, comment_id = %created.comment_id, "Reply created");

        Ok(ReplyThread::from_parts(created, vec![]))
    }

    /// Like a comment.
    pub async fn like_comment(&self, comment_id: &str, member_id: &str) -> AppResult<CommentThread> {
        self.comment_repo.get_by_id(comment_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if self.comment_repo.is_comment_liked(comment_id, member_id).await? {
            return Err(AppError::BadRequest(ALREADY_LIKED_COMMENT.to_string()));
        }

        let like = comment_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            comment_id: Set(comment_id.to_string()),
            member_id: Set(member_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.comment_repo.create_comment_like(&txn, like).await?;
        self.comment_repo
            .adjust_comment_like_count(&txn, comment_id, 1)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(comment_id = %comment_id, member_id = %member_id, "Comment liked");
        self.thread(comment_id).await
    }

    /// Withdraw a like from a comment.
    pub async fn dislike_comment(
        &self,
        comment_id: &str,
        member_id: &str,
    ) -> AppResult<CommentThread> {
        self.comment_repo.get_by_id(comment_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if !self.comment_repo.is_comment_liked(comment_id, member_id).await? {
            return Err(comment_not_liked());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let removed = self
            .comment_repo
            .delete_comment_like(&txn, comment_id, member_id)
            .await?;
        if removed == 0 {
            return Err(comment_not_liked());
        }
        self.comment_repo
            .adjust_comment_like_count(&txn, comment_id, -1)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(comment_id = %comment_id, member_id = %member_id, "Comment like withdrawn");
        self.thread(comment_id).await
    }

    /// Like a reply. The parent comment is found through the reply.
    pub async fn like_comment_reply(
        &self,
        reply_id: &str,
        member_id: &str,
    ) -> AppResult<ReplyThread> {
        self.comment_repo.get_reply_by_id(reply_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if self.comment_repo.is_reply_liked(reply_id, member_id).await? {
            return Err(AppError::BadRequest(ALREADY_LIKED_REPLY.to_string()));
        }

        let like = reply_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            reply_id: Set(reply_id.to_string()),
            member_id: Set(member_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.comment_repo.create_reply_like(&txn, like).await?;
        self.comment_repo
            .adjust_reply_like_count(&txn, reply_id, 1)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(reply_id = %reply_id, member_id = %member_id, "Reply liked");
        self.reply_thread(reply_id).await
    }

    /// Withdraw a like from a reply.
    pub async fn dislike_comment_reply(
        &self,
        reply_id: &str,
        member_id: &str,
    ) -> AppResult<ReplyThread> {
        self.comment_repo.get_reply_by_id(reply_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if !self.comment_repo.is_reply_liked(reply_id, member_id).await? {
            return Err(reply_not_liked());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let removed = self
            .comment_repo
            .delete_reply_like(&txn, reply_id, member_id)
            .await?;
        if removed == 0 {
            return Err(reply_not_liked());
        }
        self.comment_repo
            .adjust_reply_like_count(&txn, reply_id, -1)
            .await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(reply_id = %reply_id, member_id = %member_id, "Reply like withdrawn");
        self.reply_thread(reply_id).await
    }

    /// Delete a comment with its replies and likes.
    ///
    /// Allowed for the comment author, the post author, or an admin.
    pub async fn delete(&self, comment_id: &str, actor: &member::Model) -> AppResult<()> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;

        let allowed = comment.member_id == actor.id
            || actor.is_admin()
            || self
                .post_repo
                .find_by_id(&comment.post_id)
                .await?
                .is_some_and(|post| post.author_id == actor.id);
        if !allowed {
            return Err(AppError::Forbidden(
                "You cannot delete this comment".to_string(),
            ));
        }

        let ids = vec![comment.id];
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.comment_repo.delete_many(&txn, &ids).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(comment_id = %comment_id, actor_id = %actor.id, "Comment deleted");
        Ok(())
    }

    /// Delete a reply with its likes.
    ///
    /// Allowed for the reply author, the comment author, or an admin.
    pub async fn delete_reply(&self, reply_id: &str, actor: &member::Model) -> AppResult<()> {
        let reply = self.comment_repo.get_reply_by_id(reply_id).await?;

        let allowed = reply.member_id == actor.id
            || actor.is_admin()
            || self
                .comment_repo
                .find_by_id(&reply.comment_id)
                .await?
                .is_some_and(|comment| comment.member_id == actor.id);
        if !allowed {
            return Err(AppError::Forbidden(
                "You cannot delete this reply".to_string(),
            ));
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.comment_repo.delete_reply(&txn, reply_id).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(reply_id = %reply_id, actor_id = %actor.id, "Reply deleted");
        Ok(())
    }

    async fn reply_thread(&self, reply_id: &str) -> AppResult<ReplyThread> {
        let reply = self.comment_repo.get_reply_by_id(reply_id).await?;
        let likes = self
            .comment_repo
            .find_likes_for_replies(std::slice::from_ref(&reply.id))
            .await?
            .into_iter()
            .map(|l| l.member_id)
            .collect();
        Ok(ReplyThread::from_parts(reply, likes))
    }

    async fn threads(&self, comments: Vec<comment::Model>) -> AppResult<Vec<CommentThread>> {
        let ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();

        let mut comment_likes: HashMap<String, Vec<String>> = HashMap::new();
        for like in self.comment_repo.find_likes_for_comments(&ids).await? {
            comment_likes
                .entry(like.comment_id)
                .or_default()
                .push(like.member_id);
        }

        let replies = self.comment_repo.find_replies_for_comments(&ids).await?;
        let reply_ids: Vec<String> = replies.iter().map(|r| r.id.clone()).collect();

        let mut reply_likes: HashMap<String, Vec<String>> = HashMap::new();
        for like in self.comment_repo.find_likes_for_replies(&reply_ids).await? {
            reply_likes
                .entry(like.reply_id)
                .or_default()
                .push(like.member_id);
        }

        let mut replies_by_comment: HashMap<String, Vec<ReplyThread>> = HashMap::new();
        for reply in replies {
            let likes = reply_likes.remove(&reply.id).unwrap_or_default();
            replies_by_comment
                .entry(reply.comment_id.clone())
                .or_default()
                .push(ReplyThread::from_parts(reply, likes));
        }

        Ok(comments
            .into_iter()
            .map(|c| {
                let likes = comment_likes.remove(&c.id).unwrap_or_default();
                let replies = replies_by_comment.remove(&c.id).unwrap_or_default();
                CommentThread::from_parts(c, likes, replies)
            })
            .collect())
    }
}

impl CommentThread {
    fn from_parts(c: comment::Model, likes: Vec<String>, replies: Vec<ReplyThread>) -> Self {
        Self {
            id: c.id,
            member_id: c.member_id,
            post_id: c.post_id,
            input: c.input,
            likes,
            like_count: c.like_count,
            replies,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

impl ReplyThread {
    fn from_parts(r: comment_reply::Model, likes: Vec<String>) -> Self {
        Self {
            id: r.id,
            comment_id: r.comment_id,
            member_id: r.member_id,
            input: r.input,
            likes,
            like_count: r.like_count,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

fn required_input(input: &str, message: &str) -> AppResult<String> {
    let text = input.trim();
    if text.is_empty() {
        Err(AppError::BadRequest(message.to_string()))
    } else {
        Ok(text.to_string())
    }
}

fn comment_not_liked() -> AppError {
    AppError::BadRequest("You have not liked this comment yet.".to_string())
}

fn reply_not_liked() -> AppError {
    AppError::BadRequest("You have not liked this reply yet.".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use borohub_db::entities::{content_post, member::MemberRole};
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

    fn test_comment(id: &str, member_id: &str, post_id: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            member_id: member_id.to_string(),
            post_id: post_id.to_string(),
            input: "nice".to_string(),
            like_count: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn test_reply(id: &str, comment_id: &str, member_id: &str) -> comment_reply::Model {
        comment_reply::Model {
            id: id.to_string(),
            comment_id: comment_id.to_string(),
            member_id: member_id.to_string(),
            input: "agreed".to_string(),
            like_count: 0,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(
            Arc::clone(&db),
            MemberRepository::new(Arc::clone(&db)),
            PostRepository::new(Arc::clone(&db)),
            CommentRepository::new(Arc::clone(&db)),
        )
    }

    #[tokio::test]
    async fn test_create_requires_input() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let input = CreateCommentInput {
            post_id: "p1".to_string(),
            input: "\n ".to_string(),
        };

        match svc.create("m1", input).await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Comment input is required"),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_on_missing_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<content_post::Model>::new()])
            .into_connection();
        let svc = service(db);
        let input = CreateCommentInput {
            post_id: "ghost".to_string(),
            input: "hello".to_string(),
        };

        assert!(matches!(
            svc.create("m1", input).await,
            Err(AppError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_like_reply_already_liked() {
        let like = reply_like::Model {
            id: "rl1".to_string(),
            reply_id: "r1".to_string(),
            member_id: "m2".to_string(),
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_reply("r1", "c1", "m1")]])
            .append_query_results([vec![test_member("m2")]])
            .append_query_results([vec![like]])
            .into_connection();
        let svc = service(db);

        match svc.like_comment_reply("r1", "m2").await {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, ALREADY_LIKED_REPLY),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dislike_comment_not_liked() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_comment("c1", "m1", "p1")]])
            .append_query_results([vec![test_member("m2")]])
            .append_query_results([Vec::<comment_like::Model>::new()])
            .into_connection();
        let svc = service(db);

        match svc.dislike_comment("c1", "m2").await {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("not liked this comment")),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_by_other_member_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_comment("c1", "m1", "p1")]])
            .into_connection();
        let svc = service(db);

        assert!(matches!(
            svc.update("c1", &test_member("m2"), "edited").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_stranger_is_forbidden() {
        let post = content_post::Model {
            id: "p1".to_string(),
            author_id: "m1".to_string(),
            content: "post".to_string(),
            like_count: 0,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_comment("c1", "m2", "p1")]])
            .append_query_results([vec![post]])
            .into_connection();
        let svc = service(db);

        assert!(matches!(
            svc.delete("c1", &test_member("m3")).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
