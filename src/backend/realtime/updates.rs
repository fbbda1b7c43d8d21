/**
 * Project Update Broadcasts
 *
 * `POST /api/projects/{id}/updates` lets a service or client push a
 * `project-update` frame to everyone in `project:<id>`, once the caller
 * passes the access gate for the project.
 */

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::realtime::hub::RoomId;
use crate::backend::server::state::AppState;
use crate::shared::{EntityKind, ServerEvent};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateRequest {
    /// Free-form update kind, e.g. `task-moved`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateResponse {
    pub delivered: usize,
}

pub async fn publish_project_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(project_id): Path<Uuid>,
    Json(update): Json<ProjectUpdateRequest>,
) -> Result<Json<ProjectUpdateResponse>, BackendError> {
    state
        .guard
        .authorize(&user, EntityKind::Project, project_id)
        .await?;

    let payload = serde_json::json!({
        "projectId": project_id,
        "type": update.kind,
        "data": update.data,
        "actor": user,
    });
    let delivered = state
        .rooms
        .broadcast(RoomId::Project(project_id), ServerEvent::ProjectUpdate, payload)
        .await;
    tracing::info!(
        "[Realtime] Project update '{}' for {} by user {} reached {} connections",
        update.kind,
        project_id,
        user.id,
        delivered
    );
    Ok(Json(ProjectUpdateResponse { delivered }))
}
