//! Route Configuration Module
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router, health check and socket route
//! └── api_routes.rs   - REST API routes
//! ```

/// Main router creation
pub mod router;

/// API routes
pub mod api_routes;

pub use router::create_router;
