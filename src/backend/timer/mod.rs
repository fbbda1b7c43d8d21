//! Time Tracking Module
//!
//! At most one running timer per user.
//!
//! ```text
//! timer/
//! ├── mod.rs       - Module exports
//! ├── tracker.rs   - TimeTracker (start / stop / active)
//! ├── store.rs     - TimerStore trait and in-memory store
//! ├── db.rs        - PostgreSQL store
//! └── handlers.rs  - REST handlers
//! ```

pub mod tracker;
pub mod store;
pub mod db;
pub mod handlers;

pub use db::PgTimerStore;
pub use store::{MemoryTimerStore, TimerStore};
pub use tracker::TimeTracker;
