//! Relationship service: follows and restrictions between members.

use std::sync::Arc;

use borohub_common::{AppError, AppResult, IdGenerator};
use borohub_db::{
    entities::{member_follow, member_restriction},
    repositories::{
        ALREADY_FOLLOWING, ALREADY_RESTRICTED, FollowRepository, MemberRepository,
        RestrictionRepository,
    },
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};

use super::member::MemberSummary;
use super::order_members_by_ids;

/// Relationship service for business logic.
#[derive(Clone)]
pub struct RelationshipService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    follow_repo: FollowRepository,
    restriction_repo: RestrictionRepository,
    id_gen: IdGenerator,
}

impl RelationshipService {
    /// Create a new relationship service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        follow_repo: FollowRepository,
        restriction_repo: RestrictionRepository,
    ) -> Self {
        Self {
            db,
            member_repo,
            follow_repo,
            restriction_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// `follower_id` starts following `member_id`.
    pub async fn follow(&self, member_id: &str, follower_id: &str) -> AppResult<()> {
        if member_id == follower_id {
            return Err(AppError::BadRequest(
                "Member cannot follow oneself".to_string(),
            ));
        }

        self.member_repo.get_by_id(member_id).await?;
        self.member_repo.get_by_id(follower_id).await?;

        if self
            .restriction_repo
            .is_restricted(member_id, follower_id)
            .await?
        {
            return Err(AppError::Forbidden(
                "This member has restricted you".to_string(),
            ));
        }

        if self.follow_repo.is_following(follower_id, member_id).await? {
            return Err(AppError::BadRequest(ALREADY_FOLLOWING.to_string()));
        }

        let model = member_follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            follower_id: Set(follower_id.to_string()),
            followee_id: Set(member_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        self.follow_repo.create(self.db.as_ref(), model).await?;

        tracing::info!(follower_id = %follower_id, followee_id = %member_id, "Member followed");
        Ok(())
    }

    /// `follower_id` stops following `member_id`.
    pub async fn unfollow(&self, member_id: &str, follower_id: &str) -> AppResult<()> {
        if member_id == follower_id {
            return Err(AppError::BadRequest(
                "Member cannot unfollow oneself".to_string(),
            ));
        }

        self.member_repo.get_by_id(member_id).await?;
        self.member_repo.get_by_id(follower_id).await?;

        let removed = self
            .follow_repo
            .delete_by_pair(self.db.as_ref(), follower_id, member_id)
            .await?;
        if removed == 0 {
            return Err(AppError::BadRequest(
                "You are not connected with this member".to_string(),
            ));
        }

        tracing::info!(follower_id = %follower_id, followee_id = %member_id, "Member unfollowed");
        Ok(())
    }

    /// `member_id` restricts `restricted_id`, severing follows both ways.
    ///
    /// Returns the number of follow edges removed.
    pub async fn restrict(&self, member_id: &str, restricted_id: &str) -> AppResult<u64> {
        if member_id == restricted_id {
            return Err(AppError::BadRequest(
                "Member cannot restrict oneself".to_string(),
            ));
        }

        self.member_repo.get_by_id(member_id).await?;
        self.member_repo.get_by_id(restricted_id).await?;

        if self
            .restriction_repo
            .is_restricted(member_id, restricted_id)
            .await?
        {
            return Err(AppError::BadRequest(ALREADY_RESTRICTED.to_string()));
        }

        let model = member_restriction::ActiveModel {
            id: Set(self.id_gen.generate()),
            member_id: Set(member_id.to_string()),
            restricted_id: Set(restricted_id.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let severed = self
            .follow_repo
            .delete_between(&txn, member_id, restricted_id)
            .await?;
        self.restriction_repo.create(&txn, model).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(
            member_id = %member_id,
            restricted_id = %restricted_id,
            severed,
            "Member restricted"
        );
        Ok(severed)
    }

    /// Lift a restriction. Follow edges are not restored.
    pub async fn unrestrict(&self, member_id: &str, restricted_id: &str) -> AppResult<()> {
        if member_id == restricted_id {
            return Err(AppError::BadRequest(
                "Member cannot unrestrict oneself".to_string(),
            ));
        }

        self.member_repo.get_by_id(member_id).await?;
        self.member_repo.get_by_id(restricted_id).await?;

        let removed = self
            .restriction_repo
            .delete_by_pair(self.db.as_ref(), member_id, restricted_id)
            .await?;
        if removed == 0 {
            return Err(AppError::BadRequest(
                "This user is not restricted".to_string(),
            ));
        }

        tracing::info!(member_id = %member_id, restricted_id = %restricted_id, "Member unrestricted");
        Ok(())
    }

    /// Members following `member_id`.
    pub async fn followers(&self, member_id: &str) -> AppResult<Vec<MemberSummary>> {
        self.member_repo.get_by_id(member_id).await?;
        let ids = self.follow_repo.find_follower_ids(member_id).await?;
        self.summaries(&ids).await
    }

    /// Members `member_id` follows.
    pub async fn following(&self, member_id: &str) -> AppResult<Vec<MemberSummary>> {
        self.member_repo.get_by_id(member_id).await?;
        let ids = self.follow_repo.find_following_ids(member_id).await?;
        self.summaries(&ids).await
    }

    /// Members `member_id` has restricted.
    pub async fn restricted(&self, member_id: &str) -> AppResult<Vec<MemberSummary>> {
        self.member_repo.get_by_id(member_id).await?;
        let ids = self.restriction_repo.find_restricted_ids(member_id).await?;
        self.summaries(&ids).await
    }

    async fn summaries(&self, ids: &[String]) -> AppResult<Vec<MemberSummary>> {
        let members = self.member_repo.find_by_ids(ids).await?;
        Ok(order_members_by_ids(ids, members)
            .iter()
            .map(MemberSummary::from)
            .collect())
    }
}
