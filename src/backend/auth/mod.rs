//! Authentication Module
//!
//! Token verification for socket handshakes and REST requests. Token
//! issuance (login, OTP, password reset) belongs to the account service and
//! is not part of this crate.

/// JWT verification and the `TokenVerifier` collaborator trait
pub mod sessions;

pub use sessions::{Claims, JwtVerifier, TokenVerifier};
