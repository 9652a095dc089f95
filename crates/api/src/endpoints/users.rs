//! User endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::UpdateUserInput;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Public user profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

impl From<hearth_db::entities::user::Model> for UserResponse {
    fn from(u: hearth_db::entities::user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            bio: u.bio,
            avatar_url: u.avatar_url,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Show request: by ID or username.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
}

/// Show a user profile.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<ShowRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = match (req.user_id, req.username) {
        (Some(user_id), _) => state.user_service.get(&user_id).await?,
        (None, Some(username)) => state.user_service.get_by_username(&username).await?,
        (None, None) => {
            return Err(hearth_common::AppError::Validation(
                "Either userId or username is required".to_string(),
            ));
        }
    };

    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's profile.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Delete the caller's account (soft).
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.user_service.delete(&user.id).await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
