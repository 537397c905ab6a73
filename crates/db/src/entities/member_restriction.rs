//! Member restriction entity (one-directional blocks).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "member_restriction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The member who restricted
    pub member_id: String,

    /// The member on the restricted list
    pub restricted_id: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Member,

    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::RestrictedId",
        to = "super::member::Column::Id",
        on_delete = "Cascade"
    )]
    Restricted,
}

impl ActiveModelBehavior for ActiveModel {}
