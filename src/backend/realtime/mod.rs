//! Real-time Collaboration Module
//!
//! Authenticated socket connections, project rooms and the command
//! dispatcher behind `GET /ws`.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs       - Module exports and documentation
//! ├── hub.rs       - Shared connection/room state and delivery
//! ├── registry.rs  - ConnectionRegistry (admit / remove / lookup)
//! ├── rooms.rs     - RoomManager (join / leave / broadcast / typing)
//! ├── dispatch.rs  - Client command handling
//! ├── socket.rs    - WebSocket upgrade and connection tasks
//! └── updates.rs   - REST-triggered project-update broadcasts
//! ```
//!
//! # Event Flow
//!
//! 1. Client opens `/ws?token=...`; the registry verifies the token
//! 2. Client sends `join-project`; the access guard checks the project
//! 3. Client sends `send-message`; the message is stored, then broadcast
//! 4. Domain events reach `user:<id>` rooms through the notification fan-out

/// Shared connection and room state
pub mod hub;

/// Connection registry
pub mod registry;

/// Room membership and broadcasting
pub mod rooms;

/// Client command dispatch
pub mod dispatch;

/// WebSocket endpoint
pub mod socket;

/// Project update broadcasts
pub mod updates;

pub use dispatch::CommandDispatcher;
pub use hub::{ConnectionId, FrameSender, RoomId};
pub use registry::{Connection, ConnectionRegistry};
pub use rooms::{JoinOutcome, RoomManager};
pub use socket::handle_socket_upgrade;
pub use updates::publish_project_update;
