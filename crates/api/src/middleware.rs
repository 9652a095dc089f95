//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use hearth_core::{
    CommentService, FriendService, HeartService, InvitationService, PostService, UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Account management and authentication.
    pub user_service: UserService,
    /// Friendship state machine.
    pub friend_service: FriendService,
    /// Content lifecycle.
    pub post_service: PostService,
    /// Comment lifecycle.
    pub comment_service: CommentService,
    /// Heart toggles.
    pub heart_service: HeartService,
    /// Email invitations.
    pub invitation_service: InvitationService,
}

/// Authentication middleware.
///
/// Resolves a bearer token into a user and stashes it in the request
/// extensions; handlers pull it out via the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
