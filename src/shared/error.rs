//! Shared Error Types
//!
//! This module defines error types that are shared between the backend and
//! any client that speaks the collaboration socket protocol. These errors
//! represent failures that do not depend on the server runtime: frame
//! decoding, payload validation and parsing of wire identifiers.
//!
//! # Error Categories
//!
//! - `SerializationError` - JSON serialization/deserialization failures
//! - `ValidationError` - Payload validation failures
//! - `ParseError` - Unrecognised wire identifiers (room ids, enum names)
//!
//! # Usage
//!
//! ```rust
//! use collabhub::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "Message content cannot be empty");
//! ```
use thiserror::Error;

/// Shared error types that can occur on either side of the socket
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Payload validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// A wire identifier could not be parsed
    #[error("Unrecognised {kind}: '{value}'")]
    ParseError {
        /// What was being parsed (e.g. "room id")
        kind: &'static str,
        /// The offending input
        value: String,
    },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(kind: &'static str, value: impl Into<String>) -> Self {
        Self::ParseError {
            kind,
            value: value.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
