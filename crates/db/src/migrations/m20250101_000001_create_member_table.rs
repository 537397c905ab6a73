//! Create member table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Member::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Member::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Member::FullName).string_len(128).not_null())
                    .col(ColumnDef::new(Member::Handle).string_len(64).not_null())
                    .col(ColumnDef::new(Member::HandleLower).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Member::EmailAddress)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Member::PasswordHash).string_len(256).not_null())
                    .col(
                        ColumnDef::new(Member::Role)
                            .string_len(16)
                            .not_null()
                            .default("member"),
                    )
                    .col(ColumnDef::new(Member::AboutMe).text())
                    .col(ColumnDef::new(Member::Location).string_len(256))
                    .col(ColumnDef::new(Member::Hobby).string_len(256))
                    .col(
                        ColumnDef::new(Member::Avatar)
                            .string_len(1024)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Member::CoverImage)
                            .string_len(1024)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Member::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Member::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: handle
        manager
            .create_index(
                Index::create()
                    .name("idx_member_handle")
                    .table(Member::Table)
                    .col(Member::Handle)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: handle_lower (case-insensitive uniqueness and prefix search)
        manager
            .create_index(
                Index::create()
                    .name("idx_member_handle_lower")
                    .table(Member::Table)
                    .col(Member::HandleLower)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Unique index: email_address
        manager
            .create_index(
                Index::create()
                    .name("idx_member_email_address")
                    .table(Member::Table)
                    .col(Member::EmailAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Member::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
    FullName,
    Handle,
    HandleLower,
    EmailAddress,
    PasswordHash,
    Role,
    AboutMe,
    Location,
    Hobby,
    Avatar,
    CoverImage,
    CreatedAt,
    UpdatedAt,
}
