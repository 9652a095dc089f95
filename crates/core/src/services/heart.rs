//! Heart service.

use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::heart::{self, HeartTargetKind},
    repositories::{CommentRepository, HeartRepository, PostRepository},
    tx,
};
use sea_orm::Set;
use serde::Serialize;

/// Heart service for business logic.
#[derive(Clone)]
pub struct HeartService {
    heart_repo: HeartRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    id_gen: IdGenerator,
}

/// The target's heart state after a toggle.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartState {
    /// Active hearts on the target.
    pub hearts_count: u64,
    /// Whether the calling user's heart is currently active.
    pub is_hearted: bool,
}

impl HeartService {
    /// Create a new heart service.
    #[must_use]
    pub const fn new(
        heart_repo: HeartRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
    ) -> Self {
        Self {
            heart_repo,
            post_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Toggle the caller's heart on a post or comment.
    ///
    /// Idempotent pair: toggling twice restores the original state. The
    /// check and the write share one transaction, and the partial unique
    /// index catches the remaining insert race, which is retried.
    pub async fn toggle(
        &self,
        user_id: &str,
        target_kind: HeartTargetKind,
        target_slug: &str,
    ) -> AppResult<HeartState> {
        let target_id = self.resolve_target(target_kind.clone(), target_slug).await?;

        tx::with_retry(self.heart_repo.conn(), |txn| {
            let user_id = user_id.to_string();
            let target_id = target_id.clone();
            let target_kind = target_kind.clone();
            let id_gen = self.id_gen.clone();
            Box::pin(async move {
                let user_id = user_id.as_str();
                let target_id = target_id.as_str();
                let target_kind = &target_kind;
                let existing =
                    HeartRepository::find_active_in(txn, user_id, target_kind.clone(), target_id)
                        .await?;

                let is_hearted = if let Some(existing) = existing {
                    let mut active: heart::ActiveModel = existing.into();
                    active.deleted_at = Set(Some(chrono::Utc::now().into()));
                    HeartRepository::update_in(txn, active).await?;
                    false
                } else {
                    let model = heart::ActiveModel {
                        id: Set(id_gen.generate()),
                        user_id: Set(user_id.to_string()),
                        target_kind: Set(target_kind.clone()),
                        target_id: Set(target_id.to_string()),
                        ..Default::default()
                    };
                    HeartRepository::insert_in(txn, model).await?;
                    true
                };

                let hearts_count =
                    HeartRepository::count_active_in(txn, target_kind.clone(), target_id).await?;

                Ok(HeartState {
                    hearts_count,
                    is_hearted,
                })
            })
        })
        .await
    }

    /// The target's current heart state for a (possibly absent) viewer.
    pub async fn state(
        &self,
        viewer_id: Option<&str>,
        target_kind: HeartTargetKind,
        target_slug: &str,
    ) -> AppResult<HeartState> {
        let target_id = self.resolve_target(target_kind.clone(), target_slug).await?;

        let hearts_count = self
            .heart_repo
            .count_active(target_kind.clone(), &target_id)
            .await?;
        let is_hearted = match viewer_id {
            Some(viewer_id) => {
                self.heart_repo
                    .is_hearted(viewer_id, target_kind, &target_id)
                    .await?
            }
            None => false,
        };

        Ok(HeartState {
            hearts_count,
            is_hearted,
        })
    }

    /// Resolve a target slug to its row ID, rejecting tombstoned targets.
    async fn resolve_target(
        &self,
        target_kind: HeartTargetKind,
        target_slug: &str,
    ) -> AppResult<String> {
        match target_kind {
            HeartTargetKind::Post => self
                .post_repo
                .find_by_slug(target_slug)
                .await?
                .map(|p| p.id)
                .ok_or_else(|| AppError::PostNotFound(target_slug.to_string())),
            HeartTargetKind::Comment => self
                .comment_repo
                .find_by_slug(target_slug)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| AppError::NotFound(format!("Comment: {target_slug}"))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_db::entities::{comment, post};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service_with(
        heart_db: MockDatabase,
        post_db: MockDatabase,
        comment_db: MockDatabase,
    ) -> HeartService {
        HeartService::new(
            HeartRepository::new(Arc::new(heart_db.into_connection())),
            PostRepository::new(Arc::new(post_db.into_connection())),
            CommentRepository::new(Arc::new(comment_db.into_connection())),
        )
    }

    #[tokio::test]
    async fn test_toggle_post_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service
            .toggle("user1", HeartTargetKind::Post, "missing")
            .await;

        match result {
            Err(AppError::PostNotFound(slug)) => assert_eq!(slug, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_toggle_comment_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()]),
        );

        let result = service
            .toggle("user1", HeartTargetKind::Comment, "missing")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    fn test_post(id: &str, slug: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: "author".to_string(),
            kind: post::PostKind::Microblog,
            slug: slug.to_string(),
            title: None,
            body: "hello".to_string(),
            image_key: None,
            event_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_original_state() {
        let active = heart::Model {
            id: "h1".to_string(),
            user_id: "u1".to_string(),
            target_kind: HeartTargetKind::Post,
            target_id: "p1".to_string(),
            created_at: Utc::now().into(),
            deleted_at: None,
        };
        let tombstoned = heart::Model {
            deleted_at: Some(Utc::now().into()),
            ..active.clone()
        };

        let heart_db = MockDatabase::new(DatabaseBackend::Postgres)
            // First toggle: no active heart, insert one, count it.
            .append_query_results([Vec::<heart::Model>::new()])
            .append_query_results([vec![active.clone()]])
            .append_query_results([vec![count_row(1)]])
            // Second toggle: the heart exists, tombstone it, count again.
            .append_query_results([vec![active]])
            .append_query_results([vec![tombstoned]])
            .append_query_results([vec![count_row(0)]]);
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![test_post("p1", "abc")], vec![test_post("p1", "abc")]]);

        let service = service_with(
            heart_db,
            post_db,
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let first = service
            .toggle("u1", HeartTargetKind::Post, "abc")
            .await
            .unwrap();
        assert!(first.is_hearted);
        assert_eq!(first.hearts_count, 1);

        let second = service
            .toggle("u1", HeartTargetKind::Post, "abc")
            .await
            .unwrap();
        assert!(!second.is_hearted);
        assert_eq!(second.hearts_count, 0);
    }

    #[tokio::test]
    async fn test_state_without_viewer() {
        let post = post::Model {
            id: "p1".to_string(),
            user_id: "u1".to_string(),
            kind: post::PostKind::Microblog,
            slug: "abc".to_string(),
            title: None,
            body: "hello".to_string(),
            image_key: None,
            event_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        };

        let heart_db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            // count_active
            vec![count_row(3)],
        ]);
        let post_db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![post]]);

        let service = service_with(
            heart_db,
            post_db,
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let state = service
            .state(None, HeartTargetKind::Post, "abc")
            .await
            .unwrap();

        assert_eq!(state.hearts_count, 3);
        assert!(!state.is_hearted);
    }

    /// Row shape returned by `SELECT COUNT(*)` on the mock backend.
    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }
}
