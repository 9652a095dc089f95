//! Friend repository.

use std::sync::Arc;

use crate::entities::{
    Friend,
    friend::{self, FriendStatus},
};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Friend repository for database operations.
#[derive(Clone)]
pub struct FriendRepository {
    db: Arc<DatabaseConnection>,
}

impl FriendRepository {
    /// Create a new friend repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for transaction scoping.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find the active directed edge requester -> recipient.
    pub async fn find_directed(
        &self,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<friend::Model>> {
        Self::find_directed_in(self.db.as_ref(), requester_id, recipient_id).await
    }

    /// Find the active directed edge requester -> recipient within a
    /// transaction.
    pub async fn find_directed_in<C: ConnectionTrait>(
        conn: &C,
        requester_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<friend::Model>> {
        Friend::find()
            .filter(friend::Column::RequesterId.eq(requester_id))
            .filter(friend::Column::RecipientId.eq(recipient_id))
            .filter(friend::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a new edge within a transaction.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: friend::ActiveModel,
    ) -> AppResult<friend::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an edge within a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: friend::ActiveModel,
    ) -> AppResult<friend::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an edge by ID, tombstoned rows included.
    pub async fn find_by_id_with_deleted(&self, id: &str) -> AppResult<Option<friend::Model>> {
        Friend::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Accepted edges touching a user, newest first.
    pub async fn list_accepted(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<friend::Model>> {
        Friend::find()
            .filter(
                Condition::any()
                    .add(friend::Column::RequesterId.eq(user_id))
                    .add(friend::Column::RecipientId.eq(user_id)),
            )
            .filter(friend::Column::Status.eq(FriendStatus::Accepted))
            .filter(friend::Column::DeletedAt.is_null())
            .order_by_desc(friend::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending edges received by a user, newest first.
    pub async fn list_received_pending(
        &self,
        user_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<friend::Model>> {
        Friend::find()
            .filter(friend::Column::RecipientId.eq(user_id))
            .filter(friend::Column::Status.eq(FriendStatus::Pending))
            .filter(friend::Column::DeletedAt.is_null())
            .order_by_desc(friend::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
