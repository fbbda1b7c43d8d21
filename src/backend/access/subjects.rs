//! Per-entity adapters onto the authorization gate.
//!
//! Each entity decides what "owner" and "members" mean for it; the rule
//! itself stays in `gate`.

use crate::shared::entities::{
    CalendarEventSnapshot, IssueSnapshot, ProjectSnapshot, TaskSnapshot,
};
use crate::shared::{AccessView, ProjectMembership};

/// Something that can be reduced to an `AccessView`
pub trait AccessSubject {
    fn access_view(&self) -> AccessView;
}

impl ProjectSnapshot {
    pub fn membership(&self) -> ProjectMembership {
        ProjectMembership {
            owner_id: self.owner_id,
            member_ids: self.member_ids.clone(),
        }
    }
}

impl AccessSubject for ProjectSnapshot {
    fn access_view(&self) -> AccessView {
        AccessView::owned_by(self.owner_id).with_members(self.member_ids.iter().copied())
    }
}

/// Project owner owns the task; project members and the creator are members.
impl AccessSubject for TaskSnapshot {
    fn access_view(&self) -> AccessView {
        let members = self
            .project
            .member_ids
            .iter()
            .copied()
            .chain(std::iter::once(self.creator_id));
        AccessView::owned_by(self.project.owner_id)
            .with_members(members)
            .with_assignee(self.assignee_id)
    }
}

impl AccessSubject for IssueSnapshot {
    fn access_view(&self) -> AccessView {
        let members = self
            .project
            .member_ids
            .iter()
            .copied()
            .chain(std::iter::once(self.reporter_id));
        AccessView::owned_by(self.project.owner_id)
            .with_members(members)
            .with_assignee(self.assignee_id)
    }
}

/// Creator owns the event, attendees are members, visibility decides the rest.
impl AccessSubject for CalendarEventSnapshot {
    fn access_view(&self) -> AccessView {
        let view = AccessView::owned_by(self.creator_id)
            .with_members(self.attendee_ids.iter().copied())
            .with_visibility(self.visibility);
        match &self.project {
            Some(project) => view.within_project(project.membership()),
            None => view,
        }
    }
}
