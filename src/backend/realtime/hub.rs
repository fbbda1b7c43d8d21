/**
 * Connection Hub State
 *
 * The connection map and the room map live in one structure behind one
 * `RwLock`, shared by `ConnectionRegistry` and `RoomManager`. Joins, leaves
 * and removals take the write lock; broadcasts take the read lock. A
 * broadcast therefore sees every connection either fully registered (with
 * all of its memberships) or fully gone, never half torn down.
 *
 * # Delivery
 *
 * Each connection owns a bounded outbound queue drained by its socket
 * writer task. Delivery is `try_send`: a full or closed queue drops the
 * frame for that connection only. Nothing ever awaits a slow client while
 * holding the hub lock.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::shared::{Identity, SocketFrame};

/// Outbound half of a connection's frame queue
pub type FrameSender = mpsc::Sender<SocketFrame>;

/// Identifier allocated to each admitted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A multicast group: `user:<id>` or `project:<id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    User(Uuid),
    Project(Uuid),
}

impl RoomId {
    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            Self::Project(id) => Some(*id),
            Self::User(_) => None,
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{}", id),
            Self::Project(id) => write!(f, "project:{}", id),
        }
    }
}

pub(crate) struct ConnectionEntry {
    pub(crate) identity: Identity,
    pub(crate) outbound: FrameSender,
    pub(crate) rooms: HashSet<RoomId>,
}

impl ConnectionEntry {
    /// Queue a frame without waiting; false if it was dropped
    pub(crate) fn push(&self, id: ConnectionId, frame: SocketFrame) -> bool {
        match self.outbound.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(frame)) => {
                tracing::warn!(
                    "[Realtime] Outbound queue full for {}, dropping '{}'",
                    id,
                    frame.event
                );
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

#[derive(Default)]
pub(crate) struct HubState {
    pub(crate) connections: HashMap<ConnectionId, ConnectionEntry>,
    pub(crate) rooms: HashMap<RoomId, HashSet<ConnectionId>>,
}

impl HubState {
    /// Add a membership; true if it was not already present
    pub(crate) fn add_member(&mut self, id: ConnectionId, room: RoomId) -> bool {
        let Some(entry) = self.connections.get_mut(&id) else {
            return false;
        };
        if !entry.rooms.insert(room) {
            return false;
        }
        self.rooms.entry(room).or_default().insert(id);
        true
    }

    /// Drop a membership; true if it was present
    pub(crate) fn remove_member(&mut self, id: ConnectionId, room: RoomId) -> bool {
        let removed = self
            .connections
            .get_mut(&id)
            .map(|entry| entry.rooms.remove(&room))
            .unwrap_or(false);
        if removed {
            self.detach(id, room);
        }
        removed
    }

    /// Remove a connection and every membership it holds
    pub(crate) fn remove_connection(&mut self, id: ConnectionId) -> Option<ConnectionEntry> {
        let entry = self.connections.remove(&id)?;
        for room in &entry.rooms {
            self.detach(id, *room);
        }
        Some(entry)
    }

    fn detach(&mut self, id: ConnectionId, room: RoomId) {
        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(&id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
    }

    /// True if another connection of `user_id` is still in `room`
    pub(crate) fn user_present_in(&self, user_id: Uuid, room: RoomId) -> bool {
        self.rooms
            .get(&room)
            .map(|members| {
                members.iter().any(|member| {
                    self.connections
                        .get(member)
                        .map(|entry| entry.identity.id == user_id)
                        .unwrap_or(false)
                })
            })
            .unwrap_or(false)
    }

    pub(crate) fn is_member(&self, id: ConnectionId, room: RoomId) -> bool {
        self.rooms
            .get(&room)
            .map(|members| members.contains(&id))
            .unwrap_or(false)
    }

    /// Deliver a frame to every member of `room` except `skip`
    pub(crate) fn deliver(
        &self,
        room: RoomId,
        frame: &SocketFrame,
        skip: Option<ConnectionId>,
    ) -> usize {
        let Some(members) = self.rooms.get(&room) else {
            return 0;
        };
        members
            .iter()
            .filter(|id| Some(**id) != skip)
            .filter_map(|id| self.connections.get(id).map(|entry| (id, entry)))
            .filter(|(id, entry)| entry.push(**id, frame.clone()))
            .count()
    }
}
