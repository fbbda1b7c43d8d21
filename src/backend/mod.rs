//! Backend Module
//!
//! Server-side collaboration core: authenticated sockets, project rooms,
//! a single authorization gate, notification fan-out and time tracking,
//! exposed through an Axum server.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`access`** - AuthorizationGate: one pure decision function plus per-entity adapters
//! - **`auth`** - Token verification (JWT)
//! - **`realtime`** - ConnectionRegistry, RoomManager, socket endpoint
//! - **`chat`** - Project chat persistence
//! - **`notify`** - NotificationFanout: records, live push, email, webhooks
//! - **`timer`** - Time tracking with one running timer per user
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration
//! - **`middleware`** - Request authentication
//! - **`error`** - Backend error type
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── access/         - Authorization gate
//! ├── auth/           - Token verification
//! ├── realtime/       - Connections and rooms
//! ├── chat/           - Chat message stores
//! ├── notify/         - Notification fan-out
//! ├── timer/          - Time tracking
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── middleware/     - Request middleware
//! └── error/          - Error types
//! ```
//!
//! # Data Flow
//!
//! A domain action is authorized by the gate, recorded by the external
//! persistence layer, then handed to the fan-out as a `DomainEvent`. The
//! fan-out stores a notification and delivers it through the room manager
//! to any live connection of the target user.

/// Authorization gate and entity adapters
pub mod access;

/// Token verification
pub mod auth;

/// Real-time connections and rooms
pub mod realtime;

/// Project chat persistence
pub mod chat;

/// Notification fan-out
pub mod notify;

/// Time tracking
pub mod timer;

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Middleware for request processing
pub mod middleware;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use notify::NotificationFanout;
pub use realtime::{ConnectionRegistry, RoomManager};
pub use server::{create_app, AppState, ServerConfig};
pub use timer::TimeTracker;
