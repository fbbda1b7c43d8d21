//! Collabhub - Real-time Collaboration Core
//!
//! Real-time collaboration and notification fan-out for a project
//! management backend.
//!
//! # Overview
//!
//! - Authenticated socket connections grouped into `user:<id>` and
//!   `project:<id>` rooms
//! - Project chat and typing indicators relayed to room members
//! - One authorization gate deciding access for projects, tasks, issues and
//!   calendar events
//! - Domain events fanned out to a durable record, a live push, an email
//!   job and webhooks
//! - Time tracking with at most one running timer per user
//!
//! # Module Structure
//!
//! - **`shared`** - Platform-agnostic types: identities, access views,
//!   socket frames, chat messages, notifications, time entries
//! - **`backend`** - Server-side code (only compiled with the `ssr` feature)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - Axum server, JWT verification, SMTP email
//!
//! # Usage
//!
//! ```rust,no_run
//! use collabhub::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
