/**
 * Identity and Access Views
 *
 * This module defines the authenticated identity attached to every live
 * connection and the normalized access view that every collaboration-sensitive
 * entity is reduced to before an access decision is made.
 *
 * # Access Views
 *
 * Projects, tasks, issues, calendar events and chat channels all carry some
 * combination of an owner, a member list, an assignee and a visibility level.
 * Instead of every service checking those fields its own way, each entity is
 * converted into an `AccessView` and handed to the single authorization gate
 * in `backend::access::gate`.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as established by token verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// User ID (the token subject)
    pub id: Uuid,
    /// Email address carried in the token
    pub email: String,
    /// Display name, when the token carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Identity {
    /// Create an identity without a display name
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            name: None,
        }
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name to show other users: display name if present, email otherwise
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Visibility level of an entity towards non-members
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// Only owner, members and assignee
    Private,
    /// Anyone belonging to the owning project
    ProjectMembers,
    /// Anyone
    Public,
}

impl Visibility {
    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::ProjectMembers => "PROJECT_MEMBERS",
            Self::Public => "PUBLIC",
        }
    }
}

impl std::str::FromStr for Visibility {
    type Err = crate::shared::SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRIVATE" => Ok(Self::Private),
            "PROJECT_MEMBERS" => Ok(Self::ProjectMembers),
            "PUBLIC" => Ok(Self::Public),
            _ => Err(crate::shared::SharedError::parse("visibility", s)),
        }
    }
}

/// Owner and members of the project an entity belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembership {
    pub owner_id: Uuid,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

impl ProjectMembership {
    /// True if the user owns or is a member of the project
    pub fn includes(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.member_ids.contains(&user_id)
    }
}

/// Normalized view of an entity for access decisions
///
/// `project` is only consulted for `Visibility::ProjectMembers`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessView {
    pub owner_id: Uuid,
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectMembership>,
}

impl AccessView {
    /// View with only an owner: everyone else is denied
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            member_ids: Vec::new(),
            visibility: None,
            assignee_id: None,
            project: None,
        }
    }

    pub fn with_members(mut self, member_ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.member_ids = member_ids.into_iter().collect();
        self
    }

    pub fn with_assignee(mut self, assignee_id: Option<Uuid>) -> Self {
        self.assignee_id = assignee_id;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn within_project(mut self, project: ProjectMembership) -> Self {
        self.project = Some(project);
        self
    }
}
