//! Core business logic for hearth.

pub mod services;

pub use services::*;
