/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Notifications
 * - `GET /api/notifications` - the caller's notifications (`?unreadOnly=true`)
 * - `POST /api/notifications/read-all` - mark all as read
 * - `POST /api/notifications/{id}/read` - mark one as read
 *
 * ## Timers
 * - `POST /api/timers/start` - start a timer on a task
 * - `POST /api/timers/stop` - stop the running timer
 * - `GET /api/timers/active` - the running timer, or `null`
 *
 * ## Projects
 * - `POST /api/projects/{id}/updates` - broadcast `project-update` to the room
 *
 * Every route requires a Bearer token.
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::notify::handlers::{
    list_notifications, mark_all_notifications_read, mark_notification_read,
};
use crate::backend::realtime::publish_project_update;
use crate::backend::server::state::AppState;
use crate::backend::timer::handlers::{active_timer, start_timer, stop_timer};

pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Notifications
        .route("/api/notifications", get(list_notifications))
        .route("/api/notifications/read-all", post(mark_all_notifications_read))
        .route("/api/notifications/{id}/read", post(mark_notification_read))
        // Timers
        .route("/api/timers/start", post(start_timer))
        .route("/api/timers/stop", post(stop_timer))
        .route("/api/timers/active", get(active_timer))
        // Project room broadcasts
        .route("/api/projects/{id}/updates", post(publish_project_update))
}
