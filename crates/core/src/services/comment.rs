//! Comment service.

use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{
    entities::{comment, heart::HeartTargetKind},
    repositories::{CommentRepository, HeartRepository, PostRepository},
    tx,
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Comment body bounds, counted in characters.
const BODY_MIN: usize = 1;
const BODY_MAX: usize = 2_000;

/// Attempts at finding a free slug before giving up.
const SLUG_ATTEMPTS: u32 = 5;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    heart_repo: HeartRepository,
    id_gen: IdGenerator,
}

/// Input for creating a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    /// Slug of the post being commented on.
    pub post_slug: String,

    #[validate(length(min = 1, max = 2000))]
    pub body: String,
}

/// Response for a comment.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub slug: String,
    pub post_id: String,
    pub user_id: String,
    pub body: String,
    pub hearts_count: u64,
    pub created_at: String,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        heart_repo: HeartRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            heart_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post.
    ///
    /// Same slug discipline as posts: pre-checked candidate, unique index
    /// as the authority, retry on a lost race.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<CommentResponse> {
        input.validate()?;

        let body_len = input.body.chars().count();
        if body_len < BODY_MIN || body_len > BODY_MAX {
            return Err(AppError::Validation(format!(
                "Body must be between {BODY_MIN} and {BODY_MAX} characters"
            )));
        }

        let post = self
            .post_repo
            .find_by_slug(&input.post_slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(input.post_slug.clone()))?;

        let comment = tx::with_retry(self.comment_repo.conn(), |txn| {
            let svc = self.clone();
            let post_id = post.id.clone();
            let user_id = user_id.to_string();
            let body = input.body.clone();
            Box::pin(async move {
                let slug = svc.free_slug(txn).await?;

                let model = comment::ActiveModel {
                    id: Set(svc.id_gen.generate()),
                    post_id: Set(post_id.clone()),
                    user_id: Set(user_id.clone()),
                    slug: Set(slug),
                    body: Set(body.clone()),
                    ..Default::default()
                };

                CommentRepository::insert_in(txn, model).await
            })
        })
        .await?;

        Ok(Self::to_response(comment, 0))
    }

    /// Delete a comment (soft), verified by re-query.
    pub async fn delete(&self, slug: &str, user_id: &str) -> AppResult<()> {
        tx::with_retry(self.comment_repo.conn(), |txn| {
            let slug = slug.to_string();
            let user_id = user_id.to_string();
            Box::pin(async move {
                let slug = slug.as_str();
                let user_id = user_id.as_str();
                let comment = CommentRepository::find_by_slug_in(txn, slug)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Comment: {slug}")))?;
                if comment.user_id != user_id {
                    return Err(AppError::NotAuthor(
                        "You can only delete your own comments".to_string(),
                    ));
                }

                let mut active: comment::ActiveModel = comment.into();
                active.deleted_at = Set(Some(chrono::Utc::now().into()));
                CommentRepository::update_in(txn, active).await?;
                Ok(())
            })
        })
        .await?;

        if self.comment_repo.find_by_slug(slug).await?.is_some() {
            return Err(AppError::Database(
                "Comment is still visible after deletion".to_string(),
            ));
        }

        Ok(())
    }

    /// Active comments on a post, newest first.
    ///
    /// An empty page means "no more items", not an error.
    pub async fn list(
        &self,
        post_slug: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<CommentResponse>> {
        let post = self
            .post_repo
            .find_by_slug(post_slug)
            .await?
            .ok_or_else(|| AppError::PostNotFound(post_slug.to_string()))?;

        let comments = self
            .comment_repo
            .list_by_post(&post.id, offset, limit)
            .await?;

        let mut responses = Vec::with_capacity(comments.len());
        for comment in comments {
            let hearts_count = self
                .heart_repo
                .count_active(HeartTargetKind::Comment, &comment.id)
                .await?;
            responses.push(Self::to_response(comment, hearts_count));
        }
        Ok(responses)
    }

    /// Find a slug no row is using yet.
    async fn free_slug(&self, txn: &sea_orm::DatabaseTransaction) -> AppResult<String> {
        for _ in 0..SLUG_ATTEMPTS {
            let candidate = self.id_gen.generate_slug();
            if !CommentRepository::slug_exists_in(txn, &candidate).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "Could not generate a unique slug".to_string(),
        ))
    }

    fn to_response(comment: comment::Model, hearts_count: u64) -> CommentResponse {
        CommentResponse {
            id: comment.id,
            slug: comment.slug,
            post_id: comment.post_id,
            user_id: comment.user_id,
            body: comment.body,
            hearts_count,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}
