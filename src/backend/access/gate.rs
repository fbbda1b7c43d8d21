/**
 * Authorization Gate
 *
 * The single access predicate for every collaboration-sensitive feature.
 * Rooms, chat, calendar visibility, time tracking and project updates all
 * reduce their entity to an `AccessView` (see `subjects`) and ask this
 * module; none of them re-derive the rule.
 *
 * # Rule
 *
 * Evaluated in order, first match wins:
 *
 * 1. actor owns the subject
 * 2. actor is a member of the subject
 * 3. actor is the subject's assignee
 * 4. subject is `PUBLIC`
 * 5. subject is `PROJECT_MEMBERS` and actor owns or belongs to the owning project
 * 6. otherwise denied
 *
 * The gate is pure: no I/O, no clock, no state. Callers fetching a fresh
 * view before a security-sensitive mutation is their responsibility.
 */

use serde::Serialize;
use uuid::Uuid;

use crate::shared::{AccessView, Identity, Visibility};

/// Which rule granted access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGrant {
    Owner,
    Member,
    Assignee,
    Public,
    ProjectMember,
}

/// Evaluate the rule and report the first grant that applies
pub fn evaluate(actor_id: Uuid, subject: &AccessView) -> Option<AccessGrant> {
    if subject.owner_id == actor_id {
        return Some(AccessGrant::Owner);
    }
    if subject.member_ids.contains(&actor_id) {
        return Some(AccessGrant::Member);
    }
    if subject.assignee_id == Some(actor_id) {
        return Some(AccessGrant::Assignee);
    }
    match subject.visibility {
        Some(Visibility::Public) => Some(AccessGrant::Public),
        Some(Visibility::ProjectMembers) => subject
            .project
            .as_ref()
            .filter(|project| project.includes(actor_id))
            .map(|_| AccessGrant::ProjectMember),
        Some(Visibility::Private) | None => None,
    }
}

/// May `actor` observe or act on `subject`?
pub fn can_access(actor: &Identity, subject: &AccessView) -> bool {
    evaluate(actor.id, subject).is_some()
}
