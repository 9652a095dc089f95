//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for transaction scoping.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find an active comment by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<comment::Model>> {
        Self::find_by_slug_in(self.db.as_ref(), slug).await
    }

    /// Find an active comment by slug within a transaction.
    pub async fn find_by_slug_in<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
    ) -> AppResult<Option<comment::Model>> {
        Comment::find()
            .filter(comment::Column::Slug.eq(slug))
            .filter(comment::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a comment by ID, tombstoned rows included.
    pub async fn find_by_id_with_deleted(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether any row (tombstones included) already uses a slug.
    pub async fn slug_exists_in<C: ConnectionTrait>(conn: &C, slug: &str) -> AppResult<bool> {
        let count = Comment::find()
            .filter(comment::Column::Slug.eq(slug))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert a comment within a transaction.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a comment within a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: comment::ActiveModel,
    ) -> AppResult<comment::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active comments on a post, newest first.
    pub async fn list_by_post(
        &self,
        post_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::DeletedAt.is_null())
            .order_by_desc(comment::Column::Id)
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

    fn create_test_comment(id: &str, post_id: &str, user_id: &str, slug: &str) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            slug: slug.to_string(),
            body: "Nice post".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_slug_found() {
        let comment = create_test_comment("c1", "p1", "u1", "xyz789");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment.clone()]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.find_by_slug("xyz789").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().post_id, "p1");
    }

    #[tokio::test]
    async fn test_list_by_post() {
        let c1 = create_test_comment("c1", "p1", "u1", "s1");
        let c2 = create_test_comment("c2", "p1", "u2", "s2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.list_by_post("p1", 0, 10).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_post_empty() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.list_by_post("p1", 0, 10).await.unwrap();

        assert!(result.is_empty());
    }
}
