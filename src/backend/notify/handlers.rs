/**
 * Notification REST Handlers
 *
 * - `GET /api/notifications?unreadOnly=true` - the caller's notifications
 * - `POST /api/notifications/{id}/read` - mark one as read
 * - `POST /api/notifications/read-all` - mark all as read
 */

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::NotificationRecord;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationRecord>>, BackendError> {
    let records = state
        .notifications
        .list_for_user(user.id, query.unread_only)
        .await?;
    Ok(Json(records))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationRecord>, BackendError> {
    let record = state.notifications.mark_read(user.id, id).await?;
    Ok(Json(record))
}

pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<serde_json::Value>, BackendError> {
    let updated = state.notifications.mark_all_read(user.id).await?;
    tracing::debug!("[Notifications] User {} marked {} as read", user.id, updated);
    Ok(Json(serde_json::json!({ "updated": updated })))
}
