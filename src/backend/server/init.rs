/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Load the optional database (migrations included)
 * 2. Build `AppState` from configuration and collaborators
 * 3. Create the router
 * 4. Start the periodic cleanup task
 */

use axum::Router;

use crate::backend::error::BackendError;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, ServerConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// Database problems never prevent startup: without a database the server
/// runs on in-memory stores.
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, BackendError> {
    tracing::info!("Initializing collaboration server");

    let db_pool = load_database(config.database_url.as_deref()).await;
    let app_state = AppState::from_config(config, db_pool)?;

    let app = create_router(app_state.clone());
    spawn_cleanup_task(app_state);

    tracing::info!("Router configured with periodic cleanup task");
    Ok(app)
}

/// Periodically drop per-user timer locks nobody holds
pub fn spawn_cleanup_task(app_state: AppState) -> tokio::task::JoinHandle<()> {
    let period = app_state.config.cleanup_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let pruned = app_state.timers.prune_idle().await;
            tracing::debug!(
                "[Cleanup] Pruned {} idle timer locks, {} live connections",
                pruned,
                app_state.registry.connection_count().await
            );
        }
    })
}
