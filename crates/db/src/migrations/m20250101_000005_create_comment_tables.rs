//! Create comment, comment reply and like tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::Input).text().not_null())
                    .col(
                        ColumnDef::new(Comment::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Comment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_member")
                            .from(Comment::Table, Comment::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_post")
                            .from(Comment::Table, Comment::PostId)
                            .to(ContentPost::Table, ContentPost::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_post_id")
                    .table(Comment::Table)
                    .col(Comment::PostId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_member_id")
                    .table(Comment::Table)
                    .col(Comment::MemberId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommentLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommentLike::CommentId).string_len(32).not_null())
                    .col(ColumnDef::new(CommentLike::MemberId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CommentLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_like_comment")
                            .from(CommentLike::Table, CommentLike::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_like_member")
                            .from(CommentLike::Table, CommentLike::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_like_comment_member")
                    .table(CommentLike::Table)
                    .col(CommentLike::CommentId)
                    .col(CommentLike::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommentReply::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentReply::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommentReply::CommentId).string_len(32).not_null())
                    .col(ColumnDef::new(CommentReply::MemberId).string_len(32).not_null())
                    .col(ColumnDef::new(CommentReply::Input).text().not_null())
                    .col(
                        ColumnDef::new(CommentReply::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(CommentReply::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_reply_comment")
                            .from(CommentReply::Table, CommentReply::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_reply_member")
                            .from(CommentReply::Table, CommentReply::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_reply_comment_id")
                    .table(CommentReply::Table)
                    .col(CommentReply::CommentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReplyLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReplyLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReplyLike::ReplyId).string_len(32).not_null())
                    .col(ColumnDef::new(ReplyLike::MemberId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ReplyLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reply_like_reply")
                            .from(ReplyLike::Table, ReplyLike::ReplyId)
                            .to(CommentReply::Table, CommentReply::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reply_like_member")
                            .from(ReplyLike::Table, ReplyLike::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reply_like_reply_member")
                    .table(ReplyLike::Table)
                    .col(ReplyLike::ReplyId)
                    .col(ReplyLike::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReplyLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommentReply::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CommentLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    MemberId,
    PostId,
    Input,
    LikeCount,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CommentLike {
    Table,
    Id,
    CommentId,
    MemberId,
    CreatedAt,
}

#[derive(Iden)]
enum CommentReply {
    Table,
    Id,
    CommentId,
    MemberId,
    Input,
    LikeCount,
    CreatedAt,
}

#[derive(Iden)]
enum ReplyLike {
    Table,
    Id,
    ReplyId,
    MemberId,
    CreatedAt,
}

#[derive(Iden)]
enum ContentPost {
    Table,
    Id,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
