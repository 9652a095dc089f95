//! Invitation repository.

use std::sync::Arc;

use crate::entities::{Invitation, invitation};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

/// Invitation repository for database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    db: Arc<DatabaseConnection>,
}

impl InvitationRepository {
    /// Create a new invitation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for transaction scoping.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find an active invitation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<invitation::Model>> {
        Invitation::find_by_id(id)
            .filter(invitation::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an invitation by ID, tombstoned rows included.
    pub async fn find_by_id_with_deleted(&self, id: &str) -> AppResult<Option<invitation::Model>> {
        Invitation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an active, unaccepted invitation for an email address within a
    /// transaction.
    pub async fn find_active_by_email_in<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> AppResult<Option<invitation::Model>> {
        Invitation::find()
            .filter(invitation::Column::Email.eq(email))
            .filter(invitation::Column::AcceptedAt.is_null())
            .filter(invitation::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an active invitation by ID within a transaction.
    pub async fn find_by_id_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<invitation::Model>> {
        Invitation::find_by_id(id)
            .filter(invitation::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an active, unaccepted invitation by token within a transaction.
    pub async fn find_active_by_token_in<C: ConnectionTrait>(
        conn: &C,
        token: &str,
    ) -> AppResult<Option<invitation::Model>> {
        Invitation::find()
            .filter(invitation::Column::Token.eq(token))
            .filter(invitation::Column::AcceptedAt.is_null())
            .filter(invitation::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert an invitation within a transaction.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: invitation::ActiveModel,
    ) -> AppResult<invitation::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an invitation within a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: invitation::ActiveModel,
    ) -> AppResult<invitation::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active invitations sent by a user, newest first.
    pub async fn list_by_inviter(
        &self,
        inviter_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<invitation::Model>> {
        Invitation::find()
            .filter(invitation::Column::InviterId.eq(inviter_id))
            .filter(invitation::Column::DeletedAt.is_null())
            .order_by_desc(invitation::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
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

    fn create_test_invitation(id: &str, inviter_id: &str, email: &str) -> invitation::Model {
        invitation::Model {
            id: id.to_string(),
            inviter_id: inviter_id.to_string(),
            email: email.to_string(),
            token: format!("token-{id}"),
            accepted_at: None,
            created_at: Utc::now().into(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let invitation = create_test_invitation("i1", "u1", "friend@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[invitation.clone()]])
                .into_connection(),
        );

        let repo = InvitationRepository::new(db);
        let result = repo.find_by_id("i1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().email, "friend@example.com");
    }

    #[tokio::test]
    async fn test_list_by_inviter() {
        let i1 = create_test_invitation("i1", "u1", "a@example.com");
        let i2 = create_test_invitation("i2", "u1", "b@example.com");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[i1, i2]])
                .into_connection(),
        );

        let repo = InvitationRepository::new(db);
        let result = repo.list_by_inviter("u1", 0, 10).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
