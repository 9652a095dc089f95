//! Post service.
//!
//! One service carries the whole content lifecycle; the five content kinds
//! share it and differ only in validation rules and attachment support.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hearth_common::{AppError, AppResult, IdGenerator, StorageBackend};
use hearth_db::{
    entities::{
        heart::HeartTargetKind,
        post::{self, PostKind},
    },
    repositories::{HeartRepository, PostRepository},
    tx,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Microblog entries are short-form.
const MICROBLOG_BODY_MIN: usize = 2;
/// Microblog body ceiling, counted in characters.
const MICROBLOG_BODY_MAX: usize = 300;

/// Long-form body bounds (blog, discussion, event, journal).
const BODY_MIN: usize = 2;
const BODY_MAX: usize = 10_000;

/// Title ceiling for kinds that carry one.
const TITLE_MAX: usize = 256;

/// Attempts at finding a free slug before giving up.
const SLUG_ATTEMPTS: u32 = 5;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    heart_repo: HeartRepository,
    storage: Option<Arc<dyn StorageBackend>>,
    id_gen: IdGenerator,
}

/// An image payload attached to a blog or journal entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// MIME content type.
    pub content_type: String,
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    pub kind: PostKind,

    #[validate(length(max = 256))]
    pub title: Option<String>,

    pub body: String,

    /// When the event takes place (events only).
    pub event_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Image attachment (blog/journal only).
    pub image: Option<ImageUpload>,
}

/// Input for updating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(max = 256))]
    pub title: Option<String>,

    pub body: Option<String>,

    pub event_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Replacement image; the previous blob is deleted.
    pub image: Option<ImageUpload>,
}

/// Response for a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub slug: String,
    pub user_id: String,
    pub kind: PostKind,
    pub title: Option<String>,
    pub body: String,
    pub image_url: Option<String>,
    pub event_at: Option<String>,
    pub hearts_count: u64,
    pub is_hearted: Option<bool>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

/// Per-kind validation of the effective field values.
///
/// Microblog bodies are 2..=300 characters; the long-form kinds allow up to
/// 10k. Blog, discussion and event entries require a title; events require
/// a date. Counted in characters, not bytes.
fn validate_for_kind(
    kind: &PostKind,
    title: Option<&str>,
    body: &str,
    event_at: Option<&chrono::DateTime<chrono::Utc>>,
    has_image: bool,
) -> AppResult<()> {
    let body_len = body.chars().count();

    match kind {
        PostKind::Microblog => {
            if body_len < MICROBLOG_BODY_MIN || body_len > MICROBLOG_BODY_MAX {
                return Err(AppError::Validation(format!(
                    "Body must be between {MICROBLOG_BODY_MIN} and {MICROBLOG_BODY_MAX} characters"
                )));
            }
        }
        PostKind::Blog | PostKind::Discussion | PostKind::Event | PostKind::Journal => {
            if body_len < BODY_MIN || body_len > BODY_MAX {
                return Err(AppError::Validation(format!(
                    "Body must be between {BODY_MIN} and {BODY_MAX} characters"
                )));
            }
        }
    }

    match kind {
        PostKind::Blog | PostKind::Discussion | PostKind::Event => {
            let title_len = title.map_or(0, |t| t.chars().count());
            if title_len == 0 || title_len > TITLE_MAX {
                return Err(AppError::Validation(format!(
                    "Title must be between 1 and {TITLE_MAX} characters"
                )));
            }
        }
        PostKind::Microblog | PostKind::Journal => {}
    }

    if matches!(kind, PostKind::Event) && event_at.is_none() {
        return Err(AppError::Validation(
            "Events must have a date".to_string(),
        ));
    }

    if has_image && !matches!(kind, PostKind::Blog | PostKind::Journal) {
        return Err(AppError::Validation(
            "Only blog and journal entries accept images".to_string(),
        ));
    }

    Ok(())
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(post_repo: PostRepository, heart_repo: HeartRepository) -> Self {
        Self {
            post_repo,
            heart_repo,
            storage: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post service with attachment storage.
    #[must_use]
    pub fn with_storage(
        post_repo: PostRepository,
        heart_repo: HeartRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            heart_repo,
            storage: Some(storage),
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new post.
    ///
    /// The slug candidate is pre-checked against existing rows, but the
    /// unique index on insert is the authoritative check; a lost race shows
    /// up as a constraint violation and the transaction is re-run with a
    /// fresh candidate.
    pub async fn create(&self, user_id: &str, input: CreatePostInput) -> AppResult<PostResponse> {
        input.validate()?;
        validate_for_kind(
            &input.kind,
            input.title.as_deref(),
            &input.body,
            input.event_at.as_ref(),
            input.image.is_some(),
        )?;

        let post_id = self.id_gen.generate();

        // Store the attachment before the transaction; on failure the blob
        // is removed again.
        let image_key = match &input.image {
            Some(image) => Some(self.store_image(&post_id, image).await?),
            None => None,
        };

        let result = tx::with_retry(self.post_repo.conn(), |txn| {
            let svc = self.clone();
            let post_id = post_id.clone();
            let user_id = user_id.to_string();
            let kind = input.kind.clone();
            let title = input.title.clone();
            let body = input.body.clone();
            let event_at = input.event_at;
            let image_key = image_key.clone();
            Box::pin(async move {
                let slug = svc.free_slug(txn).await?;

                let model = post::ActiveModel {
                    id: Set(post_id.clone()),
                    user_id: Set(user_id.clone()),
                    kind: Set(kind.clone()),
                    slug: Set(slug),
                    title: Set(title.clone()),
                    body: Set(body.clone()),
                    image_key: Set(image_key.clone()),
                    event_at: Set(event_at.map(Into::into)),
                    ..Default::default()
                };

                PostRepository::insert_in(txn, model).await
            })
        })
        .await;

        match result {
            Ok(post) => Ok(self.to_response(post, 0, None)),
            Err(e) => {
                if let Some(key) = &image_key {
                    self.delete_blob(key).await;
                }
                Err(e)
            }
        }
    }

    /// Update a post.
    ///
    /// Fails with `NoChange` when no provided field actually differs, so
    /// callers can report a no-op distinctly from a real update.
    pub async fn update(
        &self,
        slug: &str,
        user_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<PostResponse> {
        input.validate()?;

        // Resolve and authorize before touching blob storage.
        let current = self
            .post_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;
        if current.user_id != user_id {
            return Err(AppError::NotAuthor(
                "You can only update your own posts".to_string(),
            ));
        }

        let new_image_key = match &input.image {
            Some(image) => Some(self.store_image(&current.id, image).await?),
            None => None,
        };

        let result = tx::with_retry(self.post_repo.conn(), |txn| {
            let slug = slug.to_string();
            let user_id = user_id.to_string();
            let in_title = input.title.clone();
            let in_body = input.body.clone();
            let in_event_at = input.event_at;
            let new_image_key = new_image_key.clone();
            Box::pin(async move {
                let slug = slug.as_str();
                let user_id = user_id.as_str();
                let new_image_key = new_image_key.as_deref();
                let post = PostRepository::find_by_slug_in(txn, slug)
                    .await?
                    .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;
                if post.user_id != user_id {
                    return Err(AppError::NotAuthor(
                        "You can only update your own posts".to_string(),
                    ));
                }

                let effective_title = in_title.clone().or_else(|| post.title.clone());
                let effective_body = in_body.clone().unwrap_or_else(|| post.body.clone());
                let effective_event_at: Option<chrono::DateTime<chrono::Utc>> = in_event_at
                    .or_else(|| post.event_at.map(Into::into));

                validate_for_kind(
                    &post.kind,
                    effective_title.as_deref(),
                    &effective_body,
                    effective_event_at.as_ref(),
                    new_image_key.is_some(),
                )?;

                let mut changed = false;
                let old_image_key = post.image_key.clone();
                let mut active: post::ActiveModel = post.clone().into();

                if let Some(title) = &in_title
                    && post.title.as_deref() != Some(title.as_str())
                {
                    active.title = Set(Some(title.clone()));
                    changed = true;
                }
                if let Some(body) = &in_body
                    && post.body != *body
                {
                    active.body = Set(body.clone());
                    changed = true;
                }
                if let Some(event_at) = in_event_at
                    && post.event_at.map(Into::into) != Some(event_at)
                {
                    active.event_at = Set(Some(event_at.into()));
                    changed = true;
                }
                if let Some(key) = new_image_key {
                    active.image_key = Set(Some(key.to_string()));
                    changed = true;
                }

                if !changed {
                    return Err(AppError::NoChange);
                }

                active.updated_at = Set(Some(chrono::Utc::now().into()));
                let updated = PostRepository::update_in(txn, active).await?;
                Ok((updated, old_image_key))
            })
        })
        .await;

        match result {
            Ok((updated, old_image_key)) => {
                // Replacement landed; drop the superseded blob.
                if new_image_key.is_some()
                    && let Some(old_key) = old_image_key
                {
                    self.delete_blob(&old_key).await;
                }
                Ok(self.to_response(updated, 0, None))
            }
            Err(e) => {
                if let Some(key) = &new_image_key {
                    self.delete_blob(key).await;
                }
                Err(e)
            }
        }
    }

    /// Delete a post (soft).
    ///
    /// The tombstone is verified by re-querying: the row must be gone from
    /// active lookups afterwards.
    pub async fn delete(&self, slug: &str, user_id: &str) -> AppResult<()> {
        let image_key = tx::with_retry(self.post_repo.conn(), |txn| {
            let slug = slug.to_string();
            let user_id = user_id.to_string();
            Box::pin(async move {
                let slug = slug.as_str();
                let user_id = user_id.as_str();
                let post = PostRepository::find_by_slug_in(txn, slug)
                    .await?
                    .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;
                if post.user_id != user_id {
                    return Err(AppError::NotAuthor(
                        "You can only delete your own posts".to_string(),
                    ));
                }

                let image_key = post.image_key.clone();
                let mut active: post::ActiveModel = post.into();
                active.deleted_at = Set(Some(chrono::Utc::now().into()));
                PostRepository::update_in(txn, active).await?;
                Ok(image_key)
            })
        })
        .await?;

        if self.post_repo.find_by_slug(slug).await?.is_some() {
            return Err(AppError::Database(
                "Post is still visible after deletion".to_string(),
            ));
        }

        if let Some(key) = image_key {
            self.delete_blob(&key).await;
        }

        Ok(())
    }

    /// Get a post by slug, with its heart state for the viewer.
    pub async fn get(&self, slug: &str, viewer_id: Option<&str>) -> AppResult<PostResponse> {
        let post = self
            .post_repo
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(slug.to_string()))?;

        let hearts_count = self
            .heart_repo
            .count_active(HeartTargetKind::Post, &post.id)
            .await?;
        let is_hearted = match viewer_id {
            Some(viewer_id) => Some(
                self.heart_repo
                    .is_hearted(viewer_id, HeartTargetKind::Post, &post.id)
                    .await?,
            ),
            None => None,
        };

        Ok(self.to_response(post, hearts_count, is_hearted))
    }

    /// List active posts, newest first.
    ///
    /// An empty page means "no more items", not an error.
    pub async fn list(
        &self,
        kind: Option<PostKind>,
        author_id: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<PostResponse>> {
        let posts = self.post_repo.list(kind, author_id, offset, limit).await?;

        let mut responses = Vec::with_capacity(posts.len());
        for post in posts {
            let hearts_count = self
                .heart_repo
                .count_active(HeartTargetKind::Post, &post.id)
                .await?;
            responses.push(self.to_response(post, hearts_count, None));
        }
        Ok(responses)
    }

    /// Find a slug no row is using yet.
    async fn free_slug(&self, txn: &sea_orm::DatabaseTransaction) -> AppResult<String> {
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = self.id_gen.generate_slug();
            if !PostRepository::slug_exists_in(txn, &candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "Could not generate a unique slug".to_string(),
        ))
    }

    /// Decode and persist an image payload.
    async fn store_image(&self, post_id: &str, image: &ImageUpload) -> AppResult<String> {
        let Some(storage) = &self.storage else {
            return Err(AppError::Storage(
                "Attachment storage is not configured".to_string(),
            ));
        };

        let bytes = BASE64
            .decode(image.data.as_bytes())
            .map_err(|e| AppError::Validation(format!("Invalid image payload: {e}")))?;

        let ext = match image.content_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            other => {
                return Err(AppError::Validation(format!(
                    "Unsupported image type: {other}"
                )));
            }
        };

        let key = format!("posts/{post_id}/{}.{ext}", self.id_gen.generate_token());
        storage.upload(&key, &bytes, &image.content_type).await?;
        Ok(key)
    }

    /// Best-effort blob removal; failures are logged, never surfaced.
    async fn delete_blob(&self, key: &str) {
        if let Some(storage) = &self.storage
            && let Err(e) = storage.delete(key).await
        {
            tracing::warn!(error = %e, key = %key, "Failed to delete blob");
        }
    }

    fn to_response(
        &self,
        post: post::Model,
        hearts_count: u64,
        is_hearted: Option<bool>,
    ) -> PostResponse {
        let image_url = match (&post.image_key, &self.storage) {
            (Some(key), Some(storage)) => Some(storage.public_url(key)),
            _ => None,
        };

        PostResponse {
            id: post.id,
            slug: post.slug,
            user_id: post.user_id,
            kind: post.kind,
            title: post.title,
            body: post.body,
            image_url,
            event_at: post.event_at.map(|t| t.to_rfc3339()),
            hearts_count,
            is_hearted,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_post(id: &str, user_id: &str, slug: &str, kind: PostKind) -> post::Model {
        post::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            kind,
            slug: slug.to_string(),
            title: None,
            body: "A perfectly fine body".to_string(),
            image_key: None,
            event_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn service_with(post_db: MockDatabase, heart_db: MockDatabase) -> PostService {
        PostService::new(
            PostRepository::new(Arc::new(post_db.into_connection())),
            HeartRepository::new(Arc::new(heart_db.into_connection())),
        )
    }

    // Per-kind validation boundaries

    #[test]
    fn test_microblog_body_of_one_char_fails() {
        let result = validate_for_kind(&PostKind::Microblog, None, "x", None, false);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_microblog_body_of_two_chars_succeeds() {
        assert!(validate_for_kind(&PostKind::Microblog, None, "xy", None, false).is_ok());
    }

    #[test]
    fn test_microblog_body_of_three_hundred_chars_succeeds() {
        let body = "x".repeat(300);
        assert!(validate_for_kind(&PostKind::Microblog, None, &body, None, false).is_ok());
    }

    #[test]
    fn test_microblog_body_of_three_hundred_one_chars_fails() {
        let body = "x".repeat(301);
        let result = validate_for_kind(&PostKind::Microblog, None, &body, None, false);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_microblog_counts_chars_not_bytes() {
        // 300 multibyte characters must pass even though they exceed 300 bytes.
        let body = "ä".repeat(300);
        assert!(validate_for_kind(&PostKind::Microblog, None, &body, None, false).is_ok());
    }

    #[test]
    fn test_blog_requires_title() {
        let result = validate_for_kind(&PostKind::Blog, None, "A body", None, false);
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(validate_for_kind(&PostKind::Blog, Some("Title"), "A body", None, false).is_ok());
    }

    #[test]
    fn test_event_requires_date() {
        let result = validate_for_kind(&PostKind::Event, Some("Meetup"), "Details", None, false);
        assert!(matches!(result, Err(AppError::Validation(_))));

        let when = Utc::now();
        assert!(
            validate_for_kind(&PostKind::Event, Some("Meetup"), "Details", Some(&when), false)
                .is_ok()
        );
    }

    #[test]
    fn test_image_only_for_blog_and_journal() {
        let result = validate_for_kind(&PostKind::Microblog, None, "hi there", None, true);
        assert!(matches!(result, Err(AppError::Validation(_))));

        assert!(validate_for_kind(&PostKind::Journal, None, "Dear diary", None, true).is_ok());
    }

    // Service paths

    #[tokio::test]
    async fn test_get_not_found() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let result = service.get("missing", None).await;

        match result {
            Err(AppError::PostNotFound(slug)) => assert_eq!(slug, "missing"),
            _ => panic!("Expected PostNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_update_not_author() {
        let post = create_test_post("p1", "author1", "abc", PostKind::Microblog);

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([vec![post]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = UpdatePostInput {
            title: None,
            body: Some("New body".to_string()),
            event_at: None,
            image: None,
        };
        let result = service.update("abc", "intruder", input).await;

        assert!(matches!(result, Err(AppError::NotAuthor(_))));
    }

    #[tokio::test]
    async fn test_update_with_identical_payload_is_no_change() {
        let post = create_test_post("p1", "author1", "abc", PostKind::Microblog);

        // One lookup outside the transaction, one inside it.
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![post.clone()], vec![post.clone()]]),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = UpdatePostInput {
            title: None,
            body: Some(post.body.clone()),
            event_at: None,
            image: None,
        };
        let result = service.update("abc", "author1", input).await;

        assert!(matches!(result, Err(AppError::NoChange)));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_microblog() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreatePostInput {
            kind: PostKind::Microblog,
            title: None,
            body: "x".to_string(),
            event_at: None,
            image: None,
        };
        let result = service.create("u1", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_with_image_requires_storage() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres),
            MockDatabase::new(DatabaseBackend::Postgres),
        );

        let input = CreatePostInput {
            kind: PostKind::Journal,
            title: None,
            body: "Dear diary".to_string(),
            event_at: None,
            image: Some(ImageUpload {
                data: BASE64.encode(b"bytes"),
                content_type: "image/png".to_string(),
            }),
        };
        let result = service.create("u1", input).await;

        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
