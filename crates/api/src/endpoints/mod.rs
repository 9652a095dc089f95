//! API endpoints.

mod auth;
mod comments;
mod friends;
mod hearts;
mod invitations;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/friends", friends::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/hearts", hearts::router())
        .nest("/invitations", invitations::router())
}
