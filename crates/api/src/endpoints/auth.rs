//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use hearth_common::AppResult;
use hearth_core::CreateUserInput;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Registration/login response carrying the bearer token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub token: Option<String>,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state.user_service.register(input).await?;

    Ok(ApiResponse::ok(SessionResponse {
        user_id: user.id,
        username: user.username,
        token: user.token,
    }))
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Exchange credentials for the account's bearer token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state
        .user_service
        .login(&req.username, &req.password)
        .await?;

    Ok(ApiResponse::ok(SessionResponse {
        user_id: user.id,
        username: user.username,
        token: user.token,
    }))
}

/// Token regeneration response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub token: String,
}

/// Issue a fresh bearer token, invalidating the old one.
async fn regenerate_token(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let token = state.user_service.regenerate_token(&user.id).await?;
    Ok(ApiResponse::ok(TokenResponse { token }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/regenerate-token", post(regenerate_token))
}
