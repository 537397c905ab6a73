//! Create chat, chat participant and chat entry tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chat::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chat::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chat::CreatorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Chat::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Chat::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_creator")
                            .from(Chat::Table, Chat::CreatorId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatParticipant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatParticipant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatParticipant::ChatId).string_len(32).not_null())
                    .col(ColumnDef::new(ChatParticipant::MemberId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ChatParticipant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_participant_chat")
                            .from(ChatParticipant::Table, ChatParticipant::ChatId)
                            .to(Chat::Table, Chat::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_participant_member")
                            .from(ChatParticipant::Table, ChatParticipant::MemberId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (chat_id, member_id) - a member joins a chat once
        manager
            .create_index(
                Index::create()
                    .name("idx_chat_participant_chat_member")
                    .table(ChatParticipant::Table)
                    .col(ChatParticipant::ChatId)
                    .col(ChatParticipant::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chat_participant_member_id")
                    .table(ChatParticipant::Table)
                    .col(ChatParticipant::MemberId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatEntry::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChatEntry::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ChatEntry::ChatId).string_len(32).not_null())
                    .col(ColumnDef::new(ChatEntry::SenderId).string_len(32).not_null())
                    .col(ColumnDef::new(ChatEntry::Content).text().not_null())
                    .col(ColumnDef::new(ChatEntry::ReplyToId).string_len(32))
                    .col(
                        ColumnDef::new(ChatEntry::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_entry_chat")
                            .from(ChatEntry::Table, ChatEntry::ChatId)
                            .to(Chat::Table, Chat::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_entry_sender")
                            .from(ChatEntry::Table, ChatEntry::SenderId)
                            .to(Member::Table, Member::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chat_entry_reply_to")
                            .from(ChatEntry::Table, ChatEntry::ReplyToId)
                            .to(ChatEntry::Table, ChatEntry::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (chat_id, created_at) (for reading a conversation in order)
        manager
            .create_index(
                Index::create()
                    .name("idx_chat_entry_chat_created")
                    .table(ChatEntry::Table)
                    .col(ChatEntry::ChatId)
                    .col(ChatEntry::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChatEntry::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatParticipant::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chat::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Chat {
    Table,
    Id,
    CreatorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ChatParticipant {
    Table,
    Id,
    ChatId,
    MemberId,
    CreatedAt,
}

#[derive(Iden)]
enum ChatEntry {
    Table,
    Id,
    ChatId,
    SenderId,
    Content,
    ReplyToId,
    CreatedAt,
}

#[derive(Iden)]
enum Member {
    Table,
    Id,
}
