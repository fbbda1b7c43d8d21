//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the collaboration backend and its clients. These types describe the
//! socket protocol, the normalized access views used by the authorization
//! gate, notifications and time entries.
//!
//! # Overview
//!
//! The shared module is platform-agnostic: nothing here depends on the
//! server runtime, so a client crate can depend on it with default features
//! disabled.

/// Authenticated identities and access views
pub mod identity;

/// Read-only snapshots of externally owned entities
pub mod entities;

/// Socket frames and client commands
pub mod event;

/// Project chat messages
pub mod message;

/// Notifications and domain events
pub mod notification;

/// Time tracking entries
pub mod timer;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use entities::{EntityKind, EntitySummary};
pub use error::SharedError;
pub use event::{ClientCommand, ServerEvent, SocketFrame};
pub use identity::{AccessView, Identity, ProjectMembership, Visibility};
pub use message::{ChatMessage, SendMessageRequest};
pub use notification::{DomainEvent, DomainEventKind, NotificationRecord};
pub use timer::TimeEntry;
