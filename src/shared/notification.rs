/**
 * Notifications and Domain Events
 *
 * A domain event describes something that happened to an entity (a task was
 * assigned, an issue was closed, a user was added to a project) and who should
 * hear about it. The notification fan-out turns one event into a durable
 * `NotificationRecord`, a live `notification` push, an email job and zero or
 * more webhook calls.
 *
 * # Canonical Names
 *
 * Webhook subscriptions match on `entity.action` names:
 *
 * | Event                          | Canonical name          |
 * |--------------------------------|-------------------------|
 * | task assigned                  | `task.assigned`         |
 * | task moved to DONE             | `task.completed`        |
 * | task moved to BLOCKED          | `task.blocked`          |
 * | issue assigned                 | `issue.assigned`        |
 * | issue resolved / closed        | `issue.resolved` / `issue.closed` |
 * | issue moved to BLOCKED         | `issue.blocked`         |
 * | user added to a project        | `project.member_added`  |
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::entities::{EntityKind, EntitySummary, IssueStatus, TaskStatus};
use crate::shared::SharedError;

/// Category of a stored notification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    TaskAssigned,
    IssueAssigned,
    StatusChange,
    ProjectInvite,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "TASK_ASSIGNED",
            Self::IssueAssigned => "ISSUE_ASSIGNED",
            Self::StatusChange => "STATUS_CHANGE",
            Self::ProjectInvite => "PROJECT_INVITE",
        }
    }
}

impl std::str::FromStr for NotificationType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TASK_ASSIGNED" => Ok(Self::TaskAssigned),
            "ISSUE_ASSIGNED" => Ok(Self::IssueAssigned),
            "STATUS_CHANGE" => Ok(Self::StatusChange),
            "PROJECT_INVITE" => Ok(Self::ProjectInvite),
            _ => Err(SharedError::parse("notification type", s)),
        }
    }
}

/// Named email templates understood by the mail collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum EmailTemplate {
    TaskAssignment,
    IssueAssignment,
    ProjectMemberAdded,
    TaskStatusChange,
    IssueStatusChange,
}

impl EmailTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskAssignment => "task-assignment",
            Self::IssueAssignment => "issue-assignment",
            Self::ProjectMemberAdded => "project-member-added",
            Self::TaskStatusChange => "task-status-change",
            Self::IssueStatusChange => "issue-status-change",
        }
    }
}

impl std::fmt::Display for EmailTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "status", rename_all = "snake_case")]
pub enum DomainEventKind {
    TaskAssigned,
    TaskStatusChanged(TaskStatus),
    IssueAssigned,
    IssueStatusChanged(IssueStatus),
    ProjectMemberAdded,
}

impl DomainEventKind {
    /// `entity.action` name used to match webhook subscriptions
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::TaskAssigned => "task.assigned",
            Self::TaskStatusChanged(TaskStatus::Done) => "task.completed",
            Self::TaskStatusChanged(TaskStatus::Blocked) => "task.blocked",
            Self::TaskStatusChanged(_) => "task.status_changed",
            Self::IssueAssigned => "issue.assigned",
            Self::IssueStatusChanged(IssueStatus::Resolved) => "issue.resolved",
            Self::IssueStatusChanged(IssueStatus::Closed) => "issue.closed",
            Self::IssueStatusChanged(IssueStatus::Blocked) => "issue.blocked",
            Self::IssueStatusChanged(_) => "issue.status_changed",
            Self::ProjectMemberAdded => "project.member_added",
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        match self {
            Self::TaskAssigned => NotificationType::TaskAssigned,
            Self::IssueAssigned => NotificationType::IssueAssigned,
            Self::TaskStatusChanged(_) | Self::IssueStatusChanged(_) => {
                NotificationType::StatusChange
            }
            Self::ProjectMemberAdded => NotificationType::ProjectInvite,
        }
    }

    pub fn email_template(&self) -> EmailTemplate {
        match self {
            Self::TaskAssigned => EmailTemplate::TaskAssignment,
            Self::IssueAssigned => EmailTemplate::IssueAssignment,
            Self::TaskStatusChanged(_) => EmailTemplate::TaskStatusChange,
            Self::IssueStatusChanged(_) => EmailTemplate::IssueStatusChange,
            Self::ProjectMemberAdded => EmailTemplate::ProjectMemberAdded,
        }
    }
}

/// A domain event addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    pub kind: DomainEventKind,
    pub actor_id: Uuid,
    pub target_user_id: Uuid,
    pub entity: EntitySummary,
}

impl DomainEvent {
    pub fn new(
        kind: DomainEventKind,
        actor_id: Uuid,
        target_user_id: Uuid,
        entity: EntitySummary,
    ) -> Self {
        Self {
            kind,
            actor_id,
            target_user_id,
            entity,
        }
    }

    /// Event for an assignee change on a task or issue
    ///
    /// Returns `None` when the entity was unassigned or the assignee did not
    /// change, since nobody new needs to hear about it.
    pub fn assignment_change(
        actor_id: Uuid,
        previous: Option<Uuid>,
        next: Option<Uuid>,
        entity: EntitySummary,
    ) -> Option<Self> {
        let target = next?;
        if previous == Some(target) {
            return None;
        }
        let kind = match entity.kind {
            EntityKind::Task => DomainEventKind::TaskAssigned,
            EntityKind::Issue => DomainEventKind::IssueAssigned,
            _ => return None,
        };
        Some(Self::new(kind, actor_id, target, entity))
    }

    /// Events for a status change, one per recipient
    ///
    /// Only terminal and blocked states produce events. The actor is never
    /// notified of their own change and each recipient appears once.
    pub fn status_change(
        actor_id: Uuid,
        kind: DomainEventKind,
        recipients: impl IntoIterator<Item = Uuid>,
        entity: EntitySummary,
    ) -> Vec<Self> {
        let notifiable = match kind {
            DomainEventKind::TaskStatusChanged(status) => status.is_notifiable(),
            DomainEventKind::IssueStatusChanged(status) => status.is_notifiable(),
            _ => false,
        };
        if !notifiable {
            return Vec::new();
        }

        let mut seen = Vec::new();
        for recipient in recipients {
            if recipient != actor_id && !seen.contains(&recipient) {
                seen.push(recipient);
            }
        }
        seen.into_iter()
            .map(|target| Self::new(kind, actor_id, target, entity.clone()))
            .collect()
    }

    pub fn canonical_name(&self) -> &'static str {
        self.kind.canonical_name()
    }

    /// Title shown for the notification
    pub fn title(&self) -> String {
        let subject = &self.entity.title;
        match self.kind {
            DomainEventKind::TaskAssigned => format!("Task assigned: {}", subject),
            DomainEventKind::IssueAssigned => format!("Issue assigned: {}", subject),
            DomainEventKind::TaskStatusChanged(TaskStatus::Done) => {
                format!("Task completed: {}", subject)
            }
            DomainEventKind::TaskStatusChanged(_) => format!("Task updated: {}", subject),
            DomainEventKind::IssueStatusChanged(_) => format!("Issue updated: {}", subject),
            DomainEventKind::ProjectMemberAdded => format!("Added to project: {}", subject),
        }
    }

    /// Body text of the notification
    pub fn message(&self) -> String {
        let subject = &self.entity.title;
        match self.kind {
            DomainEventKind::TaskAssigned => {
                format!("You have been assigned to task \"{}\"", subject)
            }
            DomainEventKind::IssueAssigned => {
                format!("You have been assigned to issue \"{}\"", subject)
            }
            DomainEventKind::TaskStatusChanged(status) => {
                format!("Task \"{}\" is now {:?}", subject, status)
            }
            DomainEventKind::IssueStatusChanged(status) => {
                format!("Issue \"{}\" is now {:?}", subject, status)
            }
            DomainEventKind::ProjectMemberAdded => {
                format!("You have been added to project \"{}\"", subject)
            }
        }
    }
}

/// Data needed to create a notification record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub entity: Option<EntitySummary>,
}

impl From<&DomainEvent> for NewNotification {
    fn from(event: &DomainEvent) -> Self {
        Self {
            user_id: event.target_user_id,
            title: event.title(),
            message: event.message(),
            kind: event.kind.notification_type(),
            entity: Some(event.entity.clone()),
        }
    }
}

/// A durable notification, owned by the notification store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntitySummary>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// A fresh, unread record
    pub fn create(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title,
            message: new.message,
            kind: new.kind,
            read: false,
            entity: new.entity,
            created_at: Utc::now(),
        }
    }
}
