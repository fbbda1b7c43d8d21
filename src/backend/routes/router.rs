/**
 * Router Configuration
 *
 * Combines the socket endpoint, the REST API and the health check into one
 * Axum router with request tracing.
 *
 * # Routes
 *
 * - `GET /health` - liveness and live connection count
 * - `GET /ws` - collaboration socket (token via `?token=` or Bearer header)
 * - `/api/...` - see `api_routes`
 */

use axum::{extract::State, routing::get, Json, Router};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::backend::realtime::{handle_socket_upgrade, ConnectionRegistry};
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/ws", get(handle_socket_upgrade));

    let router = configure_api_routes(router);

    router
        .fallback(|| async { (axum::http::StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health(
    State(registry): State<ConnectionRegistry>,
    State(db_pool): State<Option<PgPool>>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "connections": registry.connection_count().await,
        "database": db_pool.is_some(),
    }))
}
