//! In-memory entity snapshots, used when no database is configured and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::access::source::AccessViewSource;
use crate::backend::access::subjects::AccessSubject;
use crate::backend::error::BackendError;
use crate::shared::entities::{
    CalendarEventSnapshot, IssueSnapshot, ProjectSnapshot, TaskSnapshot,
};
use crate::shared::{AccessView, EntityKind};

#[derive(Debug, Default)]
pub struct MemoryAccessViews {
    projects: RwLock<HashMap<Uuid, ProjectSnapshot>>,
    tasks: RwLock<HashMap<Uuid, TaskSnapshot>>,
    issues: RwLock<HashMap<Uuid, IssueSnapshot>>,
    events: RwLock<HashMap<Uuid, CalendarEventSnapshot>>,
}

impl MemoryAccessViews {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_project(&self, project: ProjectSnapshot) {
        self.projects.write().await.insert(project.id, project);
    }

    pub async fn insert_task(&self, task: TaskSnapshot) {
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn insert_issue(&self, issue: IssueSnapshot) {
        self.issues.write().await.insert(issue.id, issue);
    }

    pub async fn insert_calendar_event(&self, event: CalendarEventSnapshot) {
        self.events.write().await.insert(event.id, event);
    }

    /// Add a member to an existing project; returns false if unknown
    pub async fn add_project_member(&self, project_id: Uuid, user_id: Uuid) -> bool {
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project_id) {
            Some(project) => {
                if !project.member_ids.contains(&user_id) {
                    project.member_ids.push(user_id);
                }
                true
            }
            None => false,
        }
    }

    pub async fn remove_project(&self, project_id: Uuid) -> bool {
        self.projects.write().await.remove(&project_id).is_some()
    }
}

#[async_trait]
impl AccessViewSource for MemoryAccessViews {
    async fn access_view(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> Result<Option<AccessView>, BackendError> {
        let view = match kind {
            EntityKind::Project => self.projects.read().await.get(&id).map(|p| p.access_view()),
            EntityKind::Task => self.tasks.read().await.get(&id).map(|t| t.access_view()),
            EntityKind::Issue => self.issues.read().await.get(&id).map(|i| i.access_view()),
            EntityKind::CalendarEvent => {
                self.events.read().await.get(&id).map(|e| e.access_view())
            }
        };
        Ok(view)
    }
}
