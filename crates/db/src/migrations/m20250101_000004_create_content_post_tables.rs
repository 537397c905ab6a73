//! Create content post, post media and post like tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContentPost::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContentPost::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContentPost::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(ContentPost::Content).text().not_null())
                    .col(
                        ColumnDef::new(ContentPost::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ContentPost::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ContentPost::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_content_post_author")
                            .from(ContentPost::Table, ContentPost::AuthorId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: author_id (for listing a member's posts)
        manager
            .create_index(
                Index::create()
                    .name("idx_content_post_author_id")
                    .table(ContentPost::Table)
                    .col(ContentPost::AuthorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostMedia::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostMedia::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostMedia::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostMedia::Position).integer().not_null())
                    .col(ColumnDef::new(PostMedia::Url).string_len(1024).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_media_post")
                            .from(PostMedia::Table, PostMedia::PostId)
                            .to(ContentPost::Table, ContentPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_media_post_position")
                    .table(PostMedia::Table)
                    .col(PostMedia::PostId)
                    .col(PostMedia::Position)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PostLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostLike::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(PostLike::MemberId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(PostLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_like_post")
                            .from(PostLike::Table, PostLike::PostId)
                            .to(ContentPost::Table, ContentPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_like_member")
                            .from(PostLike::Table, PostLike::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (post_id, member_id) - one like per member
        manager
            .create_index(
                Index::create()
                    .name("idx_post_like_post_member")
                    .table(PostLike::Table)
                    .col(PostLike::PostId)
                    .col(PostLike::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_post_like_member_id")
                    .table(PostLike::Table)
                    .col(PostLike::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PostMedia::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContentPost::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ContentPost {
    Table,
    Id,
    AuthorId,
    Content,
    LikeCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PostMedia {
    Table,
    Id,
    PostId,
    Position,
    Url,
}

#[derive(Iden)]
enum PostLike {
    Table,
    Id,
    PostId,
    MemberId,
    CreatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
