//! Content service: posts, their media and likes.

use std::collections::HashMap;
use std::sync::Arc;

use borohub_common::{AppError, AppResult, IdGenerator};
use borohub_db::{
    entities::{content_post, member, post_like, post_media},
    repositories::{ALREADY_LIKED_POST, CommentRepository, MemberRepository, PostRepository},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};

use super::media::MAX_POST_MEDIA;

/// Input for creating a post.
#[derive(Debug, Default, Deserialize)]
pub struct CreatePostInput {
    #[serde(default)]
    pub content: String,
    /// Media URLs, in display order.
    #[serde(default)]
    pub media: Vec<String>,
}

/// Input for updating a post. Missing or empty values keep the old ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostInput {
    pub content: Option<String>,
    pub media: Option<Vec<String>>,
}

/// A post with its media, likers and comment IDs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetails {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub media: Vec<String>,
    pub likes: Vec<String>,
    pub like_count: i32,
    pub comments: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Content service for business logic.
#[derive(Clone)]
pub struct ContentService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

impl ContentService {
    /// Create a new content service.
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

    /// Create a post.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<PostDetails> {
        let content = post_content(&input.content)?;
        let media = clean_media(input.media)?;

        self.member_repo.get_by_id(author_id).await?;

        let post_id = self.id_gen.generate();
        let now = Utc::now();
        let model = content_post::ActiveModel {
            id: Set(post_id.clone()),
            author_id: Set(author_id.to_string()),
            content: Set(content),
            like_count: Set(0),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let media_rows = self.media_rows(&post_id, &media);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let post = self.post_repo.create(&txn, model).await?;
        self.post_repo.insert_media(&txn, media_rows).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(post_id = %post.id, author_id = %author_id, media = media.len(), "Post created");

        Ok(PostDetails::from_parts(post, media, vec![], vec![]))
    }

    /// Update a post. Only its author may do so.
    pub async fn update(
        &self,
        post_id: &str,
        actor: &member::Model,
        input: UpdatePostInput,
    ) -> AppResult<PostDetails> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != actor.id {
            return Err(AppError::Forbidden(
                "You can only edit your own posts".to_string(),
            ));
        }

        let content = input
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let media = match input.media {
            Some(media) if !media.is_empty() => Some(clean_media(media)?),
            _ => None,
        };

        let mut active: content_post::ActiveModel = post.into();
        if let Some(content) = content {
            active.content = Set(content);
        }
        active.updated_at = Set(Utc::now().into());

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.post_repo.update(&txn, active).await?;
        if let Some(media) = &media {
            self.post_repo.delete_media(&txn, post_id).await?;
            self.post_repo
                .insert_media(&txn, self.media_rows(post_id, media))
                .await?;
        }
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(post_id = %post_id, media_replaced = media.is_some(), "Post updated");
        self.get(post_id).await
    }

    /// Get a post with its details.
    pub async fn get(&self, post_id: &str) -> AppResult<PostDetails> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let mut details = self.details(vec![post]).await?;
        details
            .pop()
            .ok_or_else(|| AppError::PostNotFound(post_id.to_string()))
    }

    /// Posts written by a member, newest first.
    pub async fn list_by_author(&self, member_id: &str) -> AppResult<Vec<PostDetails>> {
        self.member_repo.get_by_id(member_id).await?;
        let posts = self.post_repo.find_by_author(member_id).await?;
        tracing::debug!(member_id = %member_id, count = posts.len(), "Listing posts");
        self.details(posts).await
    }

    /// Like a post.
    pub async fn like(&self, post_id: &str, member_id: &str) -> AppResult<PostDetails> {
        self.post_repo.get_by_id(post_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if self.post_repo.is_liked(post_id, member_id).await? {
            return Err(AppError::BadRequest(ALREADY_LIKED_POST.to_string()));
        }

        let like = post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            member_id: Set(member_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        self.post_repo.create_like(&txn, like).await?;
        self.post_repo.increment_like_count(&txn, post_id).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(post_id = %post_id, member_id = %member_id, "Post liked");
        self.get(post_id).await
    }

    /// Withdraw a like from a post.
    pub async fn unlike(&self, post_id: &str, member_id: &str) -> AppResult<PostDetails> {
        self.post_repo.get_by_id(post_id).await?;
        self.member_repo.get_by_id(member_id).await?;

        if !self.post_repo.is_liked(post_id, member_id).await? {
            return Err(not_liked());
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let removed = self.post_repo.delete_like(&txn, post_id, member_id).await?;
        if removed == 0 {
            // Lost a race with a concurrent unlike; dropping `txn` rolls back.
            return Err(not_liked());
        }
        self.post_repo.decrement_like_count(&txn, post_id).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(post_id = %post_id, member_id = %member_id, "Post unliked");
        self.get(post_id).await
    }

    /// Delete a post with its comments, replies, media and likes.
    ///
    /// Allowed for the author or an admin.
    pub async fn delete(&self, post_id: &str, actor: &member::Model) -> AppResult<()> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "You can only delete your own posts".to_string(),
            ));
        }

        let post_ids = vec![post.id];

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let comment_ids = self.comment_repo.find_ids_by_posts(&txn, &post_ids).await?;
        let comments = self.comment_repo.delete_many(&txn, &comment_ids).await?;
        self.post_repo.delete_many(&txn, &post_ids).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(post_id = %post_id, actor_id = %actor.id, comments, "Post deleted");
        Ok(())
    }

    fn media_rows(&self, post_id: &str, urls: &[String]) -> Vec<post_media::ActiveModel> {
        urls.iter()
            .zip(0_i32..)
            .map(|(url, position)| post_media::ActiveModel {
                id: Set(self.id_gen.generate()),
                post_id: Set(post_id.to_string()),
                position: Set(position),
                url: Set(url.clone()),
            })
            .collect()
    }

    async fn details(&self, posts: Vec<content_post::Model>) -> AppResult<Vec<PostDetails>> {
        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();

        let mut media: HashMap<String, Vec<String>> = HashMap::new();
        for row in self.post_repo.find_media_for_posts(&ids).await? {
            media.entry(row.post_id).or_default().push(row.url);
        }

        let mut likes: HashMap<String, Vec<String>> = HashMap::new();
        for row in self.post_repo.find_likes_for_posts(&ids).await? {
            likes.entry(row.post_id).or_default().push(row.member_id);
        }

        let mut comments: HashMap<String, Vec<String>> = HashMap::new();
        for row in self.comment_repo.find_by_posts(&ids).await? {
            comments.entry(row.post_id).or_default().push(row.id);
        }

        Ok(posts
            .into_iter()
            .map(|post| {
                let media = media.remove(&post.id).unwrap_or_default();
                let likes = likes.remove(&post.id).unwrap_or_default();
                let comments = comments.remove(&post.id).unwrap_or_default();
                PostDetails::from_parts(post, media, likes, comments)
            })
            .collect())
    }
}

impl PostDetails {
    fn from_parts(
        post: content_post::Model,
        media: Vec<String>,
        likes: Vec<String>,
        comments: Vec<String>,
    ) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            content: post.content,
            media,
            likes,
            like_count: post.like_count,
            comments,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// The text of a new post: trimmed, and required.
pub fn post_content(raw: &str) -> AppResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(AppError::BadRequest("Content is required".to_string()));
    }
    Ok(content.to_string())
}

fn clean_media(media: Vec<String>) -> AppResult<Vec<String>> {
    let media: Vec<String> = media
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    if media.len() > MAX_POST_MEDIA {
        return Err(AppError::BadRequest(format!(
            "A post can carry at most {MAX_POST_MEDIA} images"
        )));
    }
    Ok(media)
}

fn not_liked() -> AppError {
    AppError::BadRequest("You have not liked this post yet.".to_string())
}
