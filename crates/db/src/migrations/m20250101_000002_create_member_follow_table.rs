//! Create member_follow table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MemberFollow::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MemberFollow::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MemberFollow::FollowerId).string_len(32).not_null())
                    .col(ColumnDef::new(MemberFollow::FolloweeId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(MemberFollow::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_follow_follower")
                            .from(MemberFollow::Table, MemberFollow::FollowerId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_member_follow_followee")
                            .from(MemberFollow::Table, MemberFollow::FolloweeId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (follower_id, followee_id) - prevent duplicate follows
        manager
            .create_index(
                Index::create()
                    .name("idx_member_follow_follower_followee")
                    .table(MemberFollow::Table)
                    .col(MemberFollow::FollowerId)
                    .col(MemberFollow::FolloweeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: followee_id (reverse lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_follow_followee_id")
                    .table(MemberFollow::Table)
                    .col(MemberFollow::FolloweeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MemberFollow::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MemberFollow {
    Table,
    Id,
    FollowerId,
    FolloweeId,
    CreatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
