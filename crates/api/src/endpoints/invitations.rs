//! Invitation endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::InviteInput;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Invitation response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationResponse {
    pub id: String,
    pub email: String,
    pub accepted: bool,
    pub created_at: String,
}

impl From<hearth_db::entities::invitation::Model> for InvitationResponse {
    fn from(i: hearth_db::entities::invitation::Model) -> Self {
        Self {
            id: i.id,
            email: i.email,
            accepted: i.accepted_at.is_some(),
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

/// Invite an email address. Delivery is fire-and-forget.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<InviteInput>,
) -> AppResult<ApiResponse<InvitationResponse>> {
    let inviter_name = user.name.clone().unwrap_or_else(|| user.username.clone());
    let invitation = state
        .invitation_service
        .invite(&user.id, &inviter_name, input)
        .await?;

    Ok(ApiResponse::ok(invitation.into()))
}

/// Accept request carrying the emailed token.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub token: String,
}

/// Accept an invitation by token.
async fn accept(
    State(state): State<AppState>,
    Json(req): Json<AcceptRequest>,
) -> AppResult<ApiResponse<InvitationResponse>> {
    let invitation = state.invitation_service.accept(&req.token).await?;
    Ok(ApiResponse::ok(invitation.into()))
}

/// Revoke request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub invitation_id: String,
}

/// Revoke an invitation the caller sent.
async fn revoke(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<RevokeRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .invitation_service
        .revoke(&user.id, &req.invitation_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Paginated list request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

const fn default_limit() -> u64 {
    10
}

/// Invitations the caller sent, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<InvitationResponse>>> {
    let limit = req.limit.min(100);
    let invitations = state
        .invitation_service
        .list_sent(&user.id, req.offset, limit)
        .await?;

    Ok(ApiResponse::ok(
        invitations.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/accept", post(accept))
        .route("/revoke", post(revoke))
        .route("/list", post(list))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_db::entities::invitation;

    #[test]
    fn test_invitation_response_never_leaks_the_token() {
        let model = invitation::Model {
            id: "i1".to_string(),
            inviter_id: "u1".to_string(),
            email: "friend@example.com".to_string(),
            token: "secret-token".to_string(),
            accepted_at: Some(Utc::now().into()),
            created_at: Utc::now().into(),
            deleted_at: None,
        };

        let response = InvitationResponse::from(model);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["accepted"], true);
        assert!(json.get("token").is_none());
        assert!(json.get("inviterId").is_none());
    }
}
