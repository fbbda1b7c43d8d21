//! Server Module
//!
//! Initialization and configuration of the Axum HTTP server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState, Collaborators and FromRef implementations
//! ├── config.rs       - Environment configuration and database loading
//! └── init.rs         - App creation and background tasks
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig, SmtpSettings};
pub use init::create_app;
pub use state::{AppState, Collaborators};
