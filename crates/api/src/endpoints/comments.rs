//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::{CommentResponse, CreateCommentInput};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Comment on a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.comment_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(comment))
}

/// Slug-addressed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugRequest {
    pub slug: String,
}

/// Delete a comment (soft).
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlugRequest>,
) -> AppResult<ApiResponse<()>> {
    state.comment_service.delete(&req.slug, &user.id).await?;
    Ok(ApiResponse::ok(()))
}

/// Paginated list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub post_slug: String,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    10
}

/// List comments on a post, newest first.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let limit = req.limit.min(100);
    let comments = state
        .comment_service
        .list(&req.post_slug, req.offset, limit)
        .await?;

    Ok(ApiResponse::ok(comments))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/delete", post(delete))
        .route("/list", post(list))
}
