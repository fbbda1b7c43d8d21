/**
 * Timer REST Handlers
 *
 * - `POST /api/timers/start` `{taskId}` - requires access to the task
 * - `POST /api/timers/stop`
 * - `GET /api/timers/active`
 */

use axum::{extract::State, http::StatusCode, Json};

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::timer::StartTimerRequest;
use crate::backend::timer::TimeTracker;
use crate::shared::{EntityKind, TimeEntry};

pub async fn start_timer(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<StartTimerRequest>,
) -> Result<(StatusCode, Json<TimeEntry>), BackendError> {
    state
        .guard
        .authorize(&user, EntityKind::Task, request.task_id)
        .await?;
    let entry = state.timers.start(user.id, request.task_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn stop_timer(
    State(timers): State<TimeTracker>,
    AuthUser(user): AuthUser,
) -> Result<Json<TimeEntry>, BackendError> {
    Ok(Json(timers.stop(user.id).await?))
}

pub async fn active_timer(
    State(timers): State<TimeTracker>,
    AuthUser(user): AuthUser,
) -> Result<Json<Option<TimeEntry>>, BackendError> {
    Ok(Json(timers.active(user.id).await?))
}
