//! Chat Backend Module
//!
//! Persistence for project chat messages. Delivery happens through the
//! project rooms in `realtime`; chat is room-scoped and never goes through
//! the notification fan-out.
//!
//! # Architecture
//!
//! - **`store`** - `MessageStore` collaborator trait and in-memory store
//! - **`db`** - PostgreSQL store

/// Message store trait and in-memory implementation
pub mod store;

/// Database operations for chat messages
pub mod db;

pub use db::PgMessageStore;
pub use store::{MemoryMessageStore, MessageStore};
