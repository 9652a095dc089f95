//! HTTP API layer for hearth.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: accounts, friendships, posts, comments, hearts, invitations
//! - **Extractors**: authenticated-user extraction
//! - **Middleware**: bearer-token authentication
//! - **Response**: the uniform success/error envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

// Allow dead_code for API compatibility fields in request structs
#![allow(dead_code)]

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
