//! Middleware Module
//!
//! Request-level concerns shared by the REST handlers.
//!
//! - **`auth`** - `AuthUser` extractor backed by the token verifier

pub mod auth;

pub use auth::{bearer_token, AuthUser};
