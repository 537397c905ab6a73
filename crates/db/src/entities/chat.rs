//! Chat entity (a conversation between members).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub creator_id: String,

    pub created_at: DateTimeWithTimeZone,

    /// Bumped whenever an entry is added
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::CreatorId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::chat_participant::Entity")]
    Participants,

    #[sea_orm(has_many = "super::chat_entry::Entity")]
    Entries,
}

impl Related<super::chat_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl Related<super::chat_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
