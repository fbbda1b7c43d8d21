//! Backend Error Module
//!
//! This module defines error types specific to the backend server.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - HTTP response conversion
//! ```
//!
//! Errors surface two ways: as JSON HTTP responses through `IntoResponse`,
//! and as `error` frames on the originating socket through
//! `BackendError::to_frame`.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
