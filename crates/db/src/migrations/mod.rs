//! Database migrations.

pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_table;
mod m20250601_000002_create_friend_table;
mod m20250601_000003_create_post_table;
mod m20250601_000004_create_comment_table;
mod m20250601_000005_create_heart_table;
mod m20250601_000006_create_invitation_table;

/// Migration runner.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_table::Migration),
            Box::new(m20250601_000002_create_friend_table::Migration),
            Box::new(m20250601_000003_create_post_table::Migration),
            Box::new(m20250601_000004_create_comment_table::Migration),
            Box::new(m20250601_000005_create_heart_table::Migration),
            Box::new(m20250601_000006_create_invitation_table::Migration),
        ]
    }
}
