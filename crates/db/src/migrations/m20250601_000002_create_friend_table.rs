//! Create friend table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Friend::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friend::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friend::RequesterId).string_len(32).not_null())
                    .col(ColumnDef::new(Friend::RecipientId).string_len(32).not_null())
                    .col(ColumnDef::new(Friend::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Friend::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Friend::UpdatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Friend::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_requester")
                            .from(Friend::Table, Friend::RequesterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_recipient")
                            .from(Friend::Table, Friend::RecipientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial unique index: one active edge per direction. The unordered
        // pair invariant is enforced by checking both directions inside the
        // mutation transaction.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_friend_active_pair \
                 ON friend (requester_id, recipient_id) \
                 WHERE deleted_at IS NULL",
            )
            .await?;

        // Index: recipient_id (for listing received requests)
        manager
            .create_index(
                Index::create()
                    .name("idx_friend_recipient_id")
                    .table(Friend::Table)
                    .col(Friend::RecipientId)
                    .to_owned(),
            )
            .await?;

        // Index: requester_id (for listing sent requests)
        manager
            .create_index(
                Index::create()
                    .name("idx_friend_requester_id")
                    .table(Friend::Table)
                    .col(Friend::RequesterId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friend::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Friend {
    Table,
    Id,
    RequesterId,
    RecipientId,
    Status,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
