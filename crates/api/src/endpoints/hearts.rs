//! Heart endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::HeartState;
use hearth_db::entities::heart::HeartTargetKind;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Heart target request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRequest {
    pub target_kind: HeartTargetKind,
    pub target_slug: String,
}

/// Toggle the caller's heart on a post or comment.
async fn toggle(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<HeartState>> {
    let heart_state = state
        .heart_service
        .toggle(&user.id, req.target_kind, &req.target_slug)
        .await?;
    Ok(ApiResponse::ok(heart_state))
}

/// The target's heart count and whether the viewer hearts it.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<TargetRequest>,
) -> AppResult<ApiResponse<HeartState>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let heart_state = state
        .heart_service
        .state(viewer_id, req.target_kind, &req.target_slug)
        .await?;
    Ok(ApiResponse::ok(heart_state))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(toggle))
        .route("/show", post(show))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_request_accepts_camel_case() {
        let req: TargetRequest =
            serde_json::from_str(r#"{"targetKind":"comment","targetSlug":"abc"}"#).unwrap();

        assert!(matches!(req.target_kind, HeartTargetKind::Comment));
        assert_eq!(req.target_slug, "abc");
    }

    #[test]
    fn test_target_request_rejects_unknown_kind() {
        let result = serde_json::from_str::<TargetRequest>(
            r#"{"targetKind":"user","targetSlug":"abc"}"#,
        );

        assert!(result.is_err());
    }
}
