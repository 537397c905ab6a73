//! Member entity (registered accounts).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Regular member.
    #[sea_orm(string_value = "member")]
    #[default]
    Member,
    /// Administrator, allowed to delete other members and their content.
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub full_name: String,

    #[sea_orm(unique)]
    pub handle: String,

    /// Lowercased handle, used for case-insensitive lookup and search
    pub handle_lower: String,

    /// Always stored lowercased
    #[sea_orm(unique)]
    pub email_address: String,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: MemberRole,

    #[sea_orm(column_type = "Text", nullable)]
    pub about_me: Option<String>,

    #[sea_orm(nullable)]
    pub location: Option<String>,

    #[sea_orm(nullable)]
    pub hobby: Option<String>,

    /// Avatar URL, empty when unset
    pub avatar: String,

    /// Cover image URL, empty when unset
    pub cover_image: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether this member has the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == MemberRole::Admin
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_post::Entity")]
    ContentPosts,
}

impl Related<super::content_post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ContentPosts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
