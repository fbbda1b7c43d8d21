//! Access Control Module
//!
//! One authorization rule for every collaboration-sensitive feature.
//!
//! # Module Structure
//!
//! ```text
//! access/
//! ├── mod.rs       - Module exports and documentation
//! ├── gate.rs      - The pure access predicate
//! ├── subjects.rs  - Per-entity adapters producing AccessView
//! ├── source.rs    - Entity lookup collaborator + AccessGuard
//! ├── db.rs        - PostgreSQL lookup
//! └── memory.rs    - In-memory lookup
//! ```

/// The access predicate
pub mod gate;

/// Per-entity adapters
pub mod subjects;

/// Entity lookup collaborator and guard
pub mod source;

/// PostgreSQL-backed entity lookup
pub mod db;

/// In-memory entity lookup
pub mod memory;

pub use gate::{can_access, evaluate, AccessGrant};
pub use source::{AccessGuard, AccessViewSource};
pub use subjects::AccessSubject;
