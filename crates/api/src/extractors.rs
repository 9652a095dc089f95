//! Request extractors.
//!
//! The auth middleware resolves the bearer token and stashes the user model
//! in the request extensions; these extractors pull it back out so handlers
//! take an already-authenticated principal.

use axum::{extract::FromRequestParts, http::request::Parts};
use hearth_common::AppError;
use hearth_db::entities::user;

/// Authenticated caller.
///
/// Rejects the request with the uniform `Unauthorized` envelope when no
/// credential resolved.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Caller identity when present; `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}
