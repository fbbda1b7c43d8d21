/**
 * Authentication Extractor
 *
 * REST handlers take an `AuthUser` argument to require a verified identity.
 * The token is read from the `Authorization: Bearer <token>` header and
 * checked by the same verifier the socket handshake uses.
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::Identity;

/// Verified caller of a REST handler
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

/// Pull the bearer token out of request headers
pub fn bearer_token(parts: &Parts) -> Result<&str, BackendError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("[Auth] Missing Authorization header");
            BackendError::authentication("Missing authentication token")
        })?;

    header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("[Auth] Invalid Authorization header format");
        BackendError::authentication("Invalid authentication token")
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let identity = state.verifier.verify_token(token).await?;
        Ok(AuthUser(identity))
    }
}
