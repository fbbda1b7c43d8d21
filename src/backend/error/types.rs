/**
 * Backend Error Types
 *
 * This module defines the error type shared by every backend component:
 * the connection registry, rooms, notification fan-out, time tracking and
 * the HTTP handlers.
 *
 * # Error Categories
 *
 * ## Authentication
 *
 * A handshake or request token was missing, malformed or expired. On a
 * socket this is terminal: an `error` frame is sent and the transport closed.
 *
 * ## Authorization / Not Found
 *
 * The actor tried to observe or act on an entity it cannot access, or the
 * entity does not exist. On a socket these are non-fatal and reported to the
 * requesting connection only.
 *
 * ## Conflict
 *
 * A second timer was started while one is already running.
 *
 * ## Delivery
 *
 * An email or webhook sink failed. These are produced by the sinks but always
 * swallowed (and logged) at the fan-out boundary.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::shared::{SharedError, SocketFrame};

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use collabhub::backend::error::BackendError;
///
/// let err = BackendError::authorization("Not a member of this project");
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Bad, missing or expired token
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Actor may not access the subject
    #[error("Authorization error: {message}")]
    Authorization { message: String },

    /// Unknown or deleted entity
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Request conflicts with current state (e.g. a timer is already running)
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Email or webhook sink failure
    #[error("Delivery error ({sink}): {message}")]
    Delivery {
        sink: &'static str,
        message: String,
    },

    /// In-process state problem (closed queue, poisoned invariant)
    #[error("State error: {message}")]
    StateError { message: String },

    /// Database failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Validation or decoding error from the shared module
    #[error(transparent)]
    SharedError(#[from] SharedError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn delivery(sink: &'static str, message: impl Into<String>) -> Self {
        Self::Delivery {
            sink,
            message: message.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::StateError {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Authentication` - 401 Unauthorized
    /// - `Authorization` - 403 Forbidden
    /// - `NotFound` - 404 Not Found
    /// - `Conflict` - 409 Conflict
    /// - `Delivery` - 502 Bad Gateway
    /// - `SharedError` - 400 Bad Request
    /// - everything else - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication { .. } => StatusCode::UNAUTHORIZED,
            Self::Authorization { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Delivery { .. } => StatusCode::BAD_GATEWAY,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
            Self::StateError { .. } | Self::Persistence(_) | Self::SerializationError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message
    ///
    /// Database and serialization details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            Self::Authentication { message }
            | Self::Authorization { message }
            | Self::NotFound { message }
            | Self::Conflict { message }
            | Self::StateError { message } => message.clone(),
            Self::Delivery { sink, .. } => format!("{} delivery failed", sink),
            Self::SharedError(err) => err.to_string(),
            Self::Persistence(_) | Self::SerializationError(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// `error` frame for the originating connection
    pub fn to_frame(&self) -> SocketFrame {
        SocketFrame::error(self.message())
    }
}
