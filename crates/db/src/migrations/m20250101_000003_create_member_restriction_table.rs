//! Create member_restriction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MemberRestriction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MemberRestriction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MemberRestriction::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(MemberRestriction::RestrictedId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(MemberRestriction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_restriction_member")
                            .from(MemberRestriction::Table, MemberRestriction::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_restriction_restricted")
                            .from(MemberRestriction::Table, MemberRestriction::RestrictedId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (member_id, restricted_id) - prevent duplicate restrictions
        manager
            .create_index(
                Index::create()
                    .name("idx_member_restriction_member_restricted")
                    .table(MemberRestriction::Table)
                    .col(MemberRestriction::MemberId)
                    .col(MemberRestriction::RestrictedId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: restricted_id (reverse lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_restriction_restricted_id")
                    .table(MemberRestriction::Table)
                    .col(MemberRestriction::RestrictedId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MemberRestriction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MemberRestriction {
    Table,
    Id,
    MemberId,
    RestrictedId,
    CreatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
