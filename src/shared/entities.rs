/**
 * Entity Snapshots
 *
 * Read-only snapshots of the domain entities owned by the external
 * persistence layer. The collaboration core never creates or mutates these;
 * it only reads them to make access decisions and to describe the subject of
 * a notification.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::identity::Visibility;
use crate::shared::SharedError;

/// Kinds of entity the core can resolve an access view for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Task,
    Issue,
    CalendarEvent,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Task => "task",
            Self::Issue => "issue",
            Self::CalendarEvent => "calendar_event",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project ownership and membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Task workflow states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Blocked,
    Done,
}

impl TaskStatus {
    /// Terminal or blocked states trigger a notification
    pub fn is_notifiable(&self) -> bool {
        matches!(self, Self::Blocked | Self::Done)
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TODO" => Ok(Self::Todo),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "IN_REVIEW" => Ok(Self::InReview),
            "BLOCKED" => Ok(Self::Blocked),
            "DONE" => Ok(Self::Done),
            _ => Err(SharedError::parse("task status", s)),
        }
    }
}

/// Issue workflow states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    Open,
    InProgress,
    Blocked,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn is_notifiable(&self) -> bool {
        matches!(self, Self::Blocked | Self::Resolved | Self::Closed)
    }
}

impl std::str::FromStr for IssueStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "BLOCKED" => Ok(Self::Blocked),
            "RESOLVED" => Ok(Self::Resolved),
            "CLOSED" => Ok(Self::Closed),
            _ => Err(SharedError::parse("issue status", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: Uuid,
    pub title: String,
    pub project: ProjectSnapshot,
    pub creator_id: Uuid,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueSnapshot {
    pub id: Uuid,
    pub title: String,
    pub project: ProjectSnapshot,
    pub reporter_id: Uuid,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    pub status: IssueStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventSnapshot {
    pub id: Uuid,
    pub title: String,
    pub creator_id: Uuid,
    #[serde(default)]
    pub attendee_ids: Vec<Uuid>,
    pub visibility: Visibility,
    #[serde(default)]
    pub project: Option<ProjectSnapshot>,
}

/// Short description of the entity a notification is about
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitySummary {
    pub kind: EntityKind,
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,
}

impl EntitySummary {
    pub fn task(task: &TaskSnapshot) -> Self {
        Self {
            kind: EntityKind::Task,
            id: task.id,
            title: task.title.clone(),
            project_id: Some(task.project.id),
        }
    }

    pub fn issue(issue: &IssueSnapshot) -> Self {
        Self {
            kind: EntityKind::Issue,
            id: issue.id,
            title: issue.title.clone(),
            project_id: Some(issue.project.id),
        }
    }

    pub fn project(project: &ProjectSnapshot, name: impl Into<String>) -> Self {
        Self {
            kind: EntityKind::Project,
            id: project.id,
            title: name.into(),
            project_id: Some(project.id),
        }
    }
}
