//! Post repository.

use std::sync::Arc;

use crate::entities::{
    Post,
    post::{self, PostKind},
};
use hearth_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The underlying connection, for transaction scoping.
    #[must_use]
    pub fn conn(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    /// Find an active post by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<post::Model>> {
        Self::find_by_slug_in(self.db.as_ref(), slug).await
    }

    /// Find an active post by slug within a transaction.
    pub async fn find_by_slug_in<C: ConnectionTrait>(
        conn: &C,
        slug: &str,
    ) -> AppResult<Option<post::Model>> {
        Post::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, tombstoned rows included.
    pub async fn find_by_id_with_deleted(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Whether any row (tombstones included) already uses a slug.
    ///
    /// Slugs are never reused; this keeps the generation loop short, but
    /// the unique index on insert is the authoritative check.
    pub async fn slug_exists_in<C: ConnectionTrait>(conn: &C, slug: &str) -> AppResult<bool> {
        let count = Post::find()
            .filter(post::Column::Slug.eq(slug))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Insert a post within a transaction.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post within a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: post::ActiveModel,
    ) -> AppResult<post::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Active posts, newest first, optionally filtered by kind and author.
    pub async fn list(
        &self,
        kind: Option<PostKind>,
        author_id: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<post::Model>> {
        let mut query = Post::find().filter(post::Column::DeletedAt.is_null());

        if let Some(kind) = kind {
            query = query.filter(post::Column::Kind.eq(kind));
        }
        if let Some(author_id) = author_id {
            query = query.filter(post::Column::UserId.eq(author_id));
        }

        query
            .order_by_desc(post::Column::Id)
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

    fn create_test_post(id: &str, user_id: &str, slug: &str, kind: PostKind) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind,
            slug: slug.to_string(),
            title: None,
            body: "Hello world".to_string(),
            image_key: None,
            event_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_slug_found() {
        let post = create_test_post("p1", "u1", "abc123", PostKind::Microblog);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_slug("abc123").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "p1");
    }

    #[tokio::test]
    async fn test_find_by_slug_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.find_by_slug("missing").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let p1 = create_test_post("p1", "u1", "s1", PostKind::Blog);
        let p2 = create_test_post("p2", "u2", "s2", PostKind::Blog);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.list(Some(PostKind::Blog), None, 0, 10).await.unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_list_empty_is_ok() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo.list(None, None, 100, 10).await.unwrap();

        assert!(result.is_empty());
    }
}
