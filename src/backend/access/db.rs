/**
 * Database-backed Access Views
 *
 * Reads ownership and membership of externally owned entities from
 * PostgreSQL. The tables are maintained by the CRUD service; this module
 * only issues SELECTs.
 */

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::access::source::AccessViewSource;
use crate::backend::access::subjects::AccessSubject;
use crate::backend::error::BackendError;
use crate::shared::entities::{
    CalendarEventSnapshot, IssueSnapshot, ProjectSnapshot, TaskSnapshot,
};
use crate::shared::{AccessView, EntityKind, Visibility};

#[derive(Clone)]
pub struct PgAccessViews {
    pool: PgPool,
}

impl PgAccessViews {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a project with its member list
    pub async fn load_project(&self, id: Uuid) -> Result<Option<ProjectSnapshot>, sqlx::Error> {
        let owner_id: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM projects WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(owner_id) = owner_id else {
            return Ok(None);
        };

        let member_ids: Vec<Uuid> =
            sqlx::query_scalar("SELECT user_id FROM project_members WHERE project_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(ProjectSnapshot {
            id,
            owner_id,
            member_ids,
        }))
    }

    pub async fn load_task(&self, id: Uuid) -> Result<Option<TaskSnapshot>, BackendError> {
        #[derive(sqlx::FromRow)]
        struct TaskRow {
            title: String,
            project_id: Uuid,
            creator_id: Uuid,
            assignee_id: Option<Uuid>,
            status: String,
        }

        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT title, project_id, creator_id, assignee_id, status
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Some(project) = self.load_project(row.project_id).await? else {
            return Ok(None);
        };

        Ok(Some(TaskSnapshot {
            id,
            title: row.title,
            project,
            creator_id: row.creator_id,
            assignee_id: row.assignee_id,
            status: row.status.parse()?,
        }))
    }

    pub async fn load_issue(&self, id: Uuid) -> Result<Option<IssueSnapshot>, BackendError> {
        #[derive(sqlx::FromRow)]
        struct IssueRow {
            title: String,
            project_id: Uuid,
            reporter_id: Uuid,
            assignee_id: Option<Uuid>,
            status: String,
        }

        let row = sqlx::query_as::<_, IssueRow>(
            r#"
            SELECT title, project_id, reporter_id, assignee_id, status
            FROM issues
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Some(project) = self.load_project(row.project_id).await? else {
            return Ok(None);
        };

        Ok(Some(IssueSnapshot {
            id,
            title: row.title,
            project,
            reporter_id: row.reporter_id,
            assignee_id: row.assignee_id,
            status: row.status.parse()?,
        }))
    }

    pub async fn load_calendar_event(
        &self,
        id: Uuid,
    ) -> Result<Option<CalendarEventSnapshot>, BackendError> {
        #[derive(sqlx::FromRow)]
        struct EventRow {
            title: String,
            creator_id: Uuid,
            visibility: String,
            project_id: Option<Uuid>,
        }

        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT title, creator_id, visibility, project_id
            FROM calendar_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let attendee_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM calendar_event_attendees WHERE event_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let project = match row.project_id {
            Some(project_id) => self.load_project(project_id).await?,
            None => None,
        };
        let visibility: Visibility = row.visibility.parse()?;

        Ok(Some(CalendarEventSnapshot {
            id,
            title: row.title,
            creator_id: row.creator_id,
            attendee_ids,
            visibility,
            project,
        }))
    }
}

#[async_trait]
impl AccessViewSource for PgAccessViews {
    async fn access_view(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<AccessView>, BackendError> {
        let view = match kind {
            EntityKind::Project => self.load_project(id).await?.map(|p| p.access_view()),
            EntityKind::Task => self.load_task(id).await?.map(|t| t.access_view()),
            EntityKind::Issue => self.load_issue(id).await?.map(|i| i.access_view()),
            EntityKind::CalendarEvent => {
                self.load_calendar_event(id).await?.map(|e| e.access_view())
            }
        };
        Ok(view)
    }
}
