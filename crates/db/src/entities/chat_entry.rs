//! Chat entry entity (a message within a chat).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub chat_id: String,

    pub sender_id: String,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Entry in the same chat this one replies to
    #[sea_orm(nullable)]
    pub reply_to_id: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chat::Entity",
        from = "Column::ChatId",
        to = "super::chat::Column::Id",
        on_delete = "Cascade"
    )]
    Chat,

    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::SenderId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ReplyToId",
        to = "Column::Id",
        on_delete = "SetNull"
    )]
    ReplyTo,
}

impl Related<super::chat::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chat.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
