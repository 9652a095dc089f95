//! Post endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::{CreatePostInput, PostResponse, UpdatePostInput};
use hearth_db::entities::post::PostKind;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Create a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user.id, input).await?;
    Ok(ApiResponse::ok(post))
}

/// Update request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub slug: String,
    #[serde(flatten)]
    pub input: UpdatePostInput,
}

/// Update a post. Replying with `NO_CHANGE` means nothing differed.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state
        .post_service
        .update(&req.slug, &user.id, req.input)
        .await?;
    Ok(ApiResponse::ok(post))
}

/// Slug-addressed request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugRequest {
    pub slug: String,
}

/// Delete a post (soft).
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlugRequest>,
) -> AppResult<ApiResponse<()>> {
    state.post_service.delete(&req.slug, &user.id).await?;
    Ok(ApiResponse::ok(()))
}

/// Show a post.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<SlugRequest>,
) -> AppResult<ApiResponse<PostResponse>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let post = state.post_service.get(&req.slug, viewer_id).await?;
    Ok(ApiResponse::ok(post))
}

/// Paginated list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub kind: Option<PostKind>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    10
}

/// List posts, newest first. An empty page means no more items.
async fn list(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<PostResponse>>> {
    let limit = req.limit.min(100);
    let posts = state
        .post_service
        .list(req.kind, req.user_id.as_deref(), req.offset, limit)
        .await?;

    Ok(ApiResponse::ok(posts))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/show", post(show))
        .route("/list", post(list))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let req: ListRequest = serde_json::from_str(r#"{"kind":"microblog"}"#).unwrap();

        assert!(matches!(req.kind, Some(PostKind::Microblog)));
        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, 10);
    }

    #[test]
    fn test_update_request_flattens_the_input() {
        let req: UpdateRequest =
            serde_json::from_str(r#"{"slug":"abc","body":"New body"}"#).unwrap();

        assert_eq!(req.slug, "abc");
        assert_eq!(req.input.body.as_deref(), Some("New body"));
        assert!(req.input.title.is_none());
    }
}
