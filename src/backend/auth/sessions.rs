/**
 * Token Verification
 *
 * Tokens are issued by the external account service; the collaboration core
 * only verifies them. A verified token yields the `Identity` attached to a
 * connection for its whole lifetime.
 */

use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::Identity;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Email
    pub email: String,
    /// Display name (optional)
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
}

/// Token-verification collaborator
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw handshake/bearer token
    ///
    /// # Errors
    ///
    /// `BackendError::Authentication` for missing, malformed or expired tokens.
    async fn verify_token(&self, raw: &str) -> Result<Identity, BackendError>;
}

/// HS256 JWT verifier
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Decode and validate the claims of a token
    pub fn decode_claims(&self, token: &str) -> Result<Claims, BackendError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("[Auth] Token rejected: {:?}", e);
            BackendError::authentication("Invalid or expired token")
        })?;
        Ok(data.claims)
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify_token(&self, raw: &str) -> Result<Identity, BackendError> {
        let token = raw.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        if token.is_empty() {
            return Err(BackendError::authentication("Missing token"));
        }

        let claims = self.decode_claims(token)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| BackendError::authentication("Invalid user ID in token"))?;

        Ok(Identity {
            id,
            email: claims.email,
            name: claims.name,
        })
    }
}
