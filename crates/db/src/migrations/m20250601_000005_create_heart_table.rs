//! Create heart table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Heart::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Heart::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Heart::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Heart::TargetKind).string_len(16).not_null())
                    .col(ColumnDef::new(Heart::TargetId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Heart::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Heart::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_heart_user")
                            .from(Heart::Table, Heart::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Partial unique index: at most one active heart per (user, target).
        // This is the backstop for concurrent toggles; soft-deleted rows do
        // not block re-hearting.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX idx_heart_active_user_target \
                 ON heart (user_id, target_kind, target_id) \
                 WHERE deleted_at IS NULL",
            )
            .await?;

        // Index: (target_kind, target_id) for heart counts
        manager
            .create_index(
                Index::create()
                    .name("idx_heart_target")
                    .table(Heart::Table)
                    .col(Heart::TargetKind)
                    .col(Heart::TargetId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Heart::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Heart {
    Table,
    Id,
    UserId,
    TargetKind,
    TargetId,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
