//! Create invitation table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Invitation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invitation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invitation::InviterId).string_len(32).not_null())
                    .col(ColumnDef::new(Invitation::Email).string_len(320).not_null())
                    .col(
                        ColumnDef::new(Invitation::Token)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Invitation::AcceptedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Invitation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Invitation::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_invitation_inviter")
                            .from(Invitation::Table, Invitation::InviterId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: inviter_id (for listing sent invitations)
        manager
            .create_index(
                Index::create()
                    .name("idx_invitation_inviter_id")
                    .table(Invitation::Table)
                    .col(Invitation::InviterId)
                    .to_owned(),
            )
            .await?;

        // Index: email (for duplicate checks)
        manager
            .create_index(
                Index::create()
                    .name("idx_invitation_email")
                    .table(Invitation::Table)
                    .col(Invitation::Email)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Invitation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Invitation {
    Table,
    Id,
    InviterId,
    Email,
    Token,
    AcceptedAt,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
