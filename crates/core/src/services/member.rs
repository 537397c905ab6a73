//! Member service: accounts, sign-in and profiles.

use std::sync::{Arc, LazyLock};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use borohub_common::{AppError, AppResult, IdGenerator};
use borohub_db::{
    entities::member::{self, MemberRole},
    repositories::{FollowRepository, MemberRepository, PostRepository, RestrictionRepository},
};
use chrono::Utc;
use regex::Regex;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Maximum number of results returned by a member search.
const SEARCH_LIMIT: u64 = 20;

#[allow(clippy::expect_used)]
static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{1,32}$").expect("handle pattern is valid"));

/// Input for registering a new member.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeAccountInput {
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,

    #[validate(length(min = 1, max = 32))]
    pub handle: String,

    #[validate(email)]
    pub email_address: String,

    #[validate(length(min = 8, max = 128))]
    pub plain_password: String,

    /// Requested role. Only honored for configured admin addresses.
    #[serde(default)]
    pub role: Option<MemberRole>,

    #[validate(length(max = 500))]
    pub about_me: Option<String>,

    #[validate(length(max = 128))]
    pub location: Option<String>,

    #[validate(length(max = 128))]
    pub hobby: Option<String>,

    pub avatar: Option<String>,

    pub cover_image: Option<String>,
}

/// Sign-in credentials. Either the email address or the handle identifies
/// the member.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessAccountInput {
    pub email_address: Option<String>,
    pub handle: Option<String>,
    #[serde(default)]
    pub plain_password: String,
}

/// Profile fields a member may change.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemberInput {
    #[validate(length(min = 1, max = 128))]
    pub full_name: Option<String>,

    #[validate(length(max = 500))]
    pub about_me: Option<String>,

    #[validate(length(max = 128))]
    pub location: Option<String>,

    #[validate(length(max = 128))]
    pub hobby: Option<String>,
}

/// Follow edges of a member.
#[derive(Debug, Clone, Serialize)]
pub struct Connections {
    pub followers: Vec<String>,
    pub following: Vec<String>,
}

/// Sanitized member view. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub id: String,
    pub full_name: String,
    pub handle: String,
    pub email_address: String,
    pub role: MemberRole,
    pub about_me: Option<String>,
    pub location: Option<String>,
    pub hobby: Option<String>,
    pub avatar: String,
    pub cover_image: String,
    pub connections: Connections,
    pub restricted_users: Vec<String>,
    pub posts: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Short member reference used in lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: String,
    pub full_name: String,
    pub handle: String,
    pub avatar: String,
}

impl From<&member::Model> for MemberSummary {
    fn from(m: &member::Model) -> Self {
        Self {
            id: m.id.clone(),
            full_name: m.full_name.clone(),
            handle: m.handle.clone(),
            avatar: m.avatar.clone(),
        }
    }
}

/// Member service for business logic.
#[derive(Clone)]
pub struct MemberService {
    db: Arc<DatabaseConnection>,
    member_repo: MemberRepository,
    follow_repo: FollowRepository,
    restriction_repo: RestrictionRepository,
    post_repo: PostRepository,
    id_gen: IdGenerator,
    admin_emails: Vec<String>,
}

impl MemberService {
    /// Create a new member service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        member_repo: MemberRepository,
        follow_repo: FollowRepository,
        restriction_repo: RestrictionRepository,
        post_repo: PostRepository,
        admin_emails: &[String],
    ) -> Self {
        Self {
            db,
            member_repo,
            follow_repo,
            restriction_repo,
            post_repo,
            id_gen: IdGenerator::new(),
            admin_emails: admin_emails.iter().map(|e| e.trim().to_lowercase()).collect(),
        }
    }

    /// Register a new member.
    pub async fn initialize_account(
        &self,
        input: InitializeAccountInput,
    ) -> AppResult<member::Model> {
        input.validate()?;
        validate_handle(&input.handle)?;

        let email = input.email_address.trim().to_lowercase();

        if self.member_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::BadRequest(
                "Email address is already registered".to_string(),
            ));
        }
        if self.member_repo.find_by_handle(&input.handle).await?.is_some() {
            return Err(AppError::BadRequest("Handle is already taken".to_string()));
        }

        let role = if self.admin_emails.contains(&email) {
            MemberRole::Admin
        } else {
            if input.role == Some(MemberRole::Admin) {
                tracing::warn!(email = %email, "Admin role requested by unlisted address");
            }
            MemberRole::Member
        };

        let password_hash = hash_password(&input.plain_password)?;
        let now = Utc::now();

        let model = member::ActiveModel {
            id: Set(self.id_gen.generate()),
            full_name: Set(input.full_name.trim().to_string()),
            handle: Set(input.handle.clone()),
            handle_lower: Set(input.handle.to_lowercase()),
            email_address: Set(email),
            password_hash: Set(password_hash),
            role: Set(role),
            about_me: Set(non_blank(input.about_me)),
            location: Set(non_blank(input.location)),
            hobby: Set(non_blank(input.hobby)),
            avatar: Set(input.avatar.unwrap_or_default()),
            cover_image: Set(input.cover_image.unwrap_or_default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let created = self.member_repo.create(self.db.as_ref(), model).await?;
        tracing::info!(member_id = %created.id, handle = %created.handle, "Member registered");

        Ok(created)
    }

    /// Check sign-in credentials and return the member.
    pub async fn access_account(&self, input: &AccessAccountInput) -> AppResult<member::Model> {
        let email = input.email_address.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let handle = input.handle.as_deref().map(str::trim).filter(|s| !s.is_empty());

        if email.is_none() && handle.is_none() {
            return Err(AppError::BadRequest(
                "Email address or handle is required".to_string(),
            ));
        }
        if input.plain_password.is_empty() {
            return Err(AppError::BadRequest("Password is required".to_string()));
        }

        let found = match (email, handle) {
            (Some(email), _) => self.member_repo.find_by_email(email).await?,
            (None, Some(handle)) => self.member_repo.find_by_handle(handle).await?,
            (None, None) => None,
        };

        let Some(member) = found else {
            return Err(incorrect_credentials());
        };

        if !verify_password(&input.plain_password, &member.password_hash)? {
            tracing::warn!(member_id = %member.id, "Failed sign-in attempt");
            return Err(incorrect_credentials());
        }

        tracing::info!(member_id = %member.id, "Member signed in");
        Ok(member)
    }

    /// Get a member by ID.
    pub async fn get(&self, member_id: &str) -> AppResult<member::Model> {
        self.member_repo.get_by_id(member_id).await
    }

    /// Get the sanitized profile of a member.
    pub async fn get_profile(&self, member_id: &str) -> AppResult<MemberProfile> {
        let member = self.member_repo.get_by_id(member_id).await?;
        self.profile_of(member).await
    }

    /// Build the sanitized profile of an already loaded member.
    pub async fn profile_of(&self, member: member::Model) -> AppResult<MemberProfile> {
        let followers = self.follow_repo.find_follower_ids(&member.id).await?;
        let following = self.follow_repo.find_following_ids(&member.id).await?;
        let restricted_users = self.restriction_repo.find_restricted_ids(&member.id).await?;
        let posts = self
            .post_repo
            .find_ids_by_author(self.db.as_ref(), &member.id)
            .await?;

        Ok(MemberProfile {
            id: member.id,
            full_name: member.full_name,
            handle: member.handle,
            email_address: member.email_address,
            role: member.role,
            about_me: member.about_me,
            location: member.location,
            hobby: member.hobby,
            avatar: member.avatar,
            cover_image: member.cover_image,
            connections: Connections {
                followers,
                following,
            },
            restricted_users,
            posts,
            created_at: member.created_at.to_rfc3339(),
            updated_at: member.updated_at.to_rfc3339(),
        })
    }

    /// Update profile fields. Only the member themself or an admin may do so.
    pub async fn update(
        &self,
        actor: &member::Model,
        member_id: &str,
        input: UpdateMemberInput,
    ) -> AppResult<MemberProfile> {
        input.validate()?;
        authorize_member_edit(actor, member_id)?;

        let member = self.member_repo.get_by_id(member_id).await?;
        let mut active: member::ActiveModel = member.into();

        if let Some(full_name) = input.full_name.map(|s| s.trim().to_string())
            && !full_name.is_empty()
        {
            active.full_name = Set(full_name);
        }
        if let Some(about_me) = input.about_me {
            active.about_me = Set(non_blank(Some(about_me)));
        }
        if let Some(location) = input.location {
            active.location = Set(non_blank(Some(location)));
        }
        if let Some(hobby) = input.hobby {
            active.hobby = Set(non_blank(Some(hobby)));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = self.member_repo.update(self.db.as_ref(), active).await?;
        tracing::info!(member_id = %updated.id, actor_id = %actor.id, "Member profile updated");

        self.profile_of(updated).await
    }

    /// Point the member's avatar at an uploaded image.
    pub async fn set_avatar(
        &self,
        actor: &member::Model,
        member_id: &str,
        url: String,
    ) -> AppResult<MemberProfile> {
        authorize_member_edit(actor, member_id)?;

        let member = self.member_repo.get_by_id(member_id).await?;
        let mut active: member::ActiveModel = member.into();
        active.avatar = Set(url);
        active.updated_at = Set(Utc::now().into());

        let updated = self.member_repo.update(self.db.as_ref(), active).await?;
        self.profile_of(updated).await
    }

    /// Point the member's cover image at an uploaded image.
    pub async fn set_cover_image(
        &self,
        actor: &member::Model,
        member_id: &str,
        url: String,
    ) -> AppResult<MemberProfile> {
        authorize_member_edit(actor, member_id)?;

        let member = self.member_repo.get_by_id(member_id).await?;
        let mut active: member::ActiveModel = member.into();
        active.cover_image = Set(url);
        active.updated_at = Set(Utc::now().into());

        let updated = self.member_repo.update(self.db.as_ref(), active).await?;
        self.profile_of(updated).await
    }

    /// Case-insensitive prefix search on handle or full name.
    pub async fn search(&self, prefix: &str) -> AppResult<Vec<MemberSummary>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(AppError::BadRequest("Search input is required".to_string()));
        }

        let members = self.member_repo.search_by_prefix(prefix, SEARCH_LIMIT).await?;
        tracing::debug!(prefix = %prefix, count = members.len(), "Member search");

        if members.is_empty() {
            return Err(AppError::NotFound(format!("No members match '{prefix}'")));
        }

        Ok(members.iter().map(MemberSummary::from).collect())
    }
}

/// Allow `actor` to edit `member_id` only when it is themself or an admin.
pub fn authorize_member_edit(actor: &member::Model, member_id: &str) -> AppResult<()> {
    if actor.id == member_id || actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only change your own account".to_string(),
        ))
    }
}

fn validate_handle(handle: &str) -> AppResult<()> {
    if HANDLE_RE.is_match(handle) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "handle: use 1-32 letters, digits, '_' or '.'".to_string(),
        ))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn incorrect_credentials() -> AppError {
    AppError::Unauthorized("Input details incorrect".to_string())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
