//! Heart repository.

use std::sync::Arc;

use crate::entities::{
    Heart,
    heart::{self, HeartTargetKind},
};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Heart repository for database operations.
#[derive(Clone)]
pub struct HeartRepository {
    db: Arc<DatabaseConnection>,
}

impl HeartRepository {
    /// Create a new heart repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for transaction scoping.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find the active heart a user has on a target.
    pub async fn find_active(
        &self,
        user_id: &str,
        target_kind: HeartTargetKind,
        target_id: &str,
    ) -> AppResult<Option<heart::Model>> {
        Self::find_active_in(self.db.as_ref(), user_id, target_kind, target_id).await
    }

    /// Find the active heart a user has on a target within a transaction.
    pub async fn find_active_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        target_kind: HeartTargetKind,
        target_id: &str,
    ) -> AppResult<Option<heart::Model>> {
        Heart::find()
            .filter(heart::Column::UserId.eq(user_id))
            .filter(heart::Column::TargetKind.eq(target_kind))
            .filter(heart::Column::TargetId.eq(target_id))
            .filter(heart::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether a user currently hearts a target.
    pub async fn is_hearted(
        &self,
        user_id: &str,
        target_kind: HeartTargetKind,
        target_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .find_active(user_id, target_kind, target_id)
            .await?
            .is_some())
    }

    /// Count active hearts on a target.
    pub async fn count_active(
        &self,
        target_kind: HeartTargetKind,
        target_id: &str,
    ) -> AppResult<u64> {
        Self::count_active_in(self.db.as_ref(), target_kind, target_id).await
    }

    /// Count active hearts on a target within a transaction.
    pub async fn count_active_in<C: ConnectionTrait>(
        conn: &C,
        target_kind: HeartTargetKind,
        target_id: &str,
    ) -> AppResult<u64> {
        Heart::find()
            .filter(heart::Column::TargetKind.eq(target_kind))
            .filter(heart::Column::TargetId.eq(target_id))
            .filter(heart::Column::DeletedAt.is_null())
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a heart within a transaction.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: heart::ActiveModel,
    ) -> AppResult<heart::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a heart within a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: heart::ActiveModel,
    ) -> AppResult<heart::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_heart(id: &str, user_id: &str, target_id: &str) -> heart::Model {
        heart::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            target_kind: HeartTargetKind::Post,
            target_id: target_id.to_string(),
            created_at: Utc::now().into(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_is_hearted_true() {
        let heart = create_test_heart("h1", "u1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[heart.clone()]])
                .into_connection(),
        );

        let repo = HeartRepository::new(db);
        let result = repo
            .is_hearted("u1", HeartTargetKind::Post, "p1")
            .await
            .unwrap();

        assert!(result);
    }

    #[tokio::test]
    async fn test_is_hearted_false() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<heart::Model>::new()])
                .into_connection(),
        );

        let repo = HeartRepository::new(db);
        let result = repo
            .is_hearted("u1", HeartTargetKind::Post, "p1")
            .await
            .unwrap();

        assert!(!result);
    }
}
