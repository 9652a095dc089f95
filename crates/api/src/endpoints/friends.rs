//! Friendship endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::RelationState;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Request targeting another user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub user_id: String,
}

/// Friendship edge response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendItemResponse {
    pub id: String,
    pub requester_id: String,
    pub recipient_id: String,
    pub status: String,
    pub created_at: String,
}

impl From<hearth_db::entities::friend::Model> for FriendItemResponse {
    fn from(f: hearth_db::entities::friend::Model) -> Self {
        let status = match f.status {
            hearth_db::entities::friend::FriendStatus::Pending => "pending",
            hearth_db::entities::friend::FriendStatus::Accepted => "accepted",
        };
        Self {
            id: f.id,
            requester_id: f.requester_id,
            recipient_id: f.recipient_id,
            status: status.to_string(),
            created_at: f.created_at.to_rfc3339(),
        }
    }
}

/// Send a friend request.
async fn request(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FriendRequest>,
) -> AppResult<ApiResponse<FriendItemResponse>> {
    let edge = state.friend_service.request(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(edge.into()))
}

/// Accept a friend request received from the given user.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FriendRequest>,
) -> AppResult<ApiResponse<FriendItemResponse>> {
    let edge = state.friend_service.accept(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(edge.into()))
}

/// Remove response: what the call did.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveResponse {
    pub outcome: String,
}

/// Cancel, decline or end the relationship with the given user.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FriendRequest>,
) -> AppResult<ApiResponse<RemoveResponse>> {
    let outcome = state.friend_service.remove(&user.id, &req.user_id).await?;
    Ok(ApiResponse::ok(RemoveResponse {
        outcome: outcome.as_str().to_string(),
    }))
}

/// Relation status response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// One of `none`, `pending`, `accepted`.
    pub status: String,
    /// Who sent the request, when one exists.
    pub requester_id: Option<String>,
}

/// The relation between the caller and the given user.
async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FriendRequest>,
) -> AppResult<ApiResponse<StatusResponse>> {
    let state_response = match state.friend_service.status(&user.id, &req.user_id).await? {
        RelationState::None => StatusResponse {
            status: "none".to_string(),
            requester_id: None,
        },
        RelationState::Pending { requester_id } => StatusResponse {
            status: "pending".to_string(),
            requester_id: Some(requester_id),
        },
        RelationState::Accepted { requester_id } => StatusResponse {
            status: "accepted".to_string(),
            requester_id: Some(requester_id),
        },
    };

    Ok(ApiResponse::ok(state_response))
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

/// Accepted friendships of the caller.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FriendItemResponse>>> {
    let limit = req.limit.min(100);
    let friends = state
        .friend_service
        .list_friends(&user.id, req.offset, limit)
        .await?;

    Ok(ApiResponse::ok(
        friends.into_iter().map(Into::into).collect(),
    ))
}

/// Pending requests the caller has received.
async fn received(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<FriendItemResponse>>> {
    let limit = req.limit.min(100);
    let invitations = state
        .friend_service
        .list_received(&user.id, req.offset, limit)
        .await?;

    Ok(ApiResponse::ok(
        invitations.into_iter().map(Into::into).collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request", post(request))
        .route("/accept", post(accept))
        .route("/remove", post(remove))
        .route("/status", post(status))
        .route("/list", post(list))
        .route("/received", post(received))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_db::entities::friend::{self, FriendStatus};

    #[test]
    fn test_friend_item_response_serialization() {
        let edge = friend::Model {
            id: "f1".to_string(),
            requester_id: "u1".to_string(),
            recipient_id: "u2".to_string(),
            status: FriendStatus::Pending,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        };

        let response = FriendItemResponse::from(edge);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["requesterId"], "u1");
        assert_eq!(json["recipientId"], "u2");
    }

    #[test]
    fn test_list_request_defaults() {
        let req: ListRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(req.offset, 0);
        assert_eq!(req.limit, 10);
    }
}
