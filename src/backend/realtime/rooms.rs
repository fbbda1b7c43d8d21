/**
 * Room Manager
 *
 * Per-user and per-project multicast groups on top of the connection
 * registry.
 *
 * # Joining
 *
 * `join` resolves the room's subject through the access guard *before*
 * touching room state; the lookup may suspend on I/O and no lock is held
 * across it. If the connection disconnected while the lookup was pending,
 * the result is discarded.
 *
 * # Broadcasting
 *
 * Broadcasts are synchronous and fire-once: the frame is queued for every
 * member present at call time, in map iteration order. No ordering is
 * promised across different senders.
 */

use uuid::Uuid;

use crate::backend::access::AccessGuard;
use crate::backend::error::BackendError;
use crate::backend::realtime::hub::{ConnectionId, HubState, RoomId};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::shared::{EntityKind, Identity, ServerEvent, SocketFrame};

/// Result of a join request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    AlreadyMember,
    /// The connection went away while authorization was pending
    Discarded,
}

#[derive(Clone)]
pub struct RoomManager {
    registry: ConnectionRegistry,
    guard: AccessGuard,
}

impl RoomManager {
    pub fn new(registry: ConnectionRegistry, guard: AccessGuard) -> Self {
        Self { registry, guard }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Join a room after the gate allows it
    ///
    /// A `user:<id>` room may only be joined by that user's own connections;
    /// a `project:<id>` room requires access to the project.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the connection or project is unknown
    /// - `Authorization` if the gate denies access
    pub async fn join(&self, id: ConnectionId, room: RoomId) -> Result<JoinOutcome, BackendError> {
        let identity = self
            .registry
            .lookup(id)
            .await
            .ok_or_else(|| BackendError::not_found("Connection not found"))?;

        match room {
            RoomId::User(user_id) if user_id != identity.id => {
                return Err(BackendError::authorization(
                    "Cannot join another user's private room",
                ));
            }
            RoomId::User(_) => {}
            RoomId::Project(project_id) => {
                self.guard
                    .authorize(&identity, EntityKind::Project, project_id)
                    .await?;
            }
        }

        let mut hub = self.registry.hub().write().await;
        if !hub.connections.contains_key(&id) {
            tracing::debug!("[Rooms] {} left before join to {} resolved", id, room);
            return Ok(JoinOutcome::Discarded);
        }
        if !hub.add_member(id, room) {
            return Ok(JoinOutcome::AlreadyMember);
        }

        let frame = SocketFrame::new(ServerEvent::UserJoined, presence_payload(&identity, room));
        let notified = hub.deliver(room, &frame, Some(id));
        tracing::info!(
            "[Rooms] {} (user {}) joined {}, notified {} members",
            id,
            identity.id,
            room,
            notified
        );
        Ok(JoinOutcome::Joined)
    }

    /// Leave a room; false if the connection was not a member
    pub async fn leave(&self, id: ConnectionId, room: RoomId) -> bool {
        let mut hub = self.registry.hub().write().await;
        let Some(identity) = hub.connections.get(&id).map(|e| e.identity.clone()) else {
            return false;
        };
        if !hub.remove_member(id, room) {
            return false;
        }

        let frame = SocketFrame::new(ServerEvent::UserLeft, presence_payload(&identity, room));
        hub.deliver(room, &frame, None);
        tracing::info!("[Rooms] {} (user {}) left {}", id, identity.id, room);
        true
    }

    /// Remove a connection and tell its project rooms
    ///
    /// `user-left` is only sent to a room when no other connection of the
    /// same user remains in it.
    pub async fn disconnect(&self, id: ConnectionId) -> Option<Identity> {
        let mut hub = self.registry.hub().write().await;
        let entry = hub.remove_connection(id)?;
        let identity = entry.identity;

        for room in entry.rooms.iter().filter(|room| room.project_id().is_some()) {
            if hub.user_present_in(identity.id, *room) {
                continue;
            }
            let frame = SocketFrame::new(ServerEvent::UserLeft, presence_payload(&identity, *room));
            hub.deliver(*room, &frame, None);
        }

        tracing::info!("[Rooms] {} (user {}) disconnected", id, identity.id);
        Some(identity)
    }

    /// Deliver to every member of `room`; returns the number of connections reached
    pub async fn broadcast(
        &self,
        room: RoomId,
        event: ServerEvent,
        payload: serde_json::Value,
    ) -> usize {
        let frame = SocketFrame::new(event, payload);
        let delivered = self.registry.hub().read().await.deliver(room, &frame, None);
        tracing::debug!("[Rooms] '{}' to {} reached {} connections", event, room, delivered);
        delivered
    }

    /// Deliver to all connections of a user; zero when offline
    pub async fn broadcast_to_user(
        &self,
        user_id: Uuid,
        event: ServerEvent,
        payload: serde_json::Value,
    ) -> usize {
        self.broadcast(RoomId::User(user_id), event, payload).await
    }

    /// Relay a typing signal to the other members of a project room
    ///
    /// Only members of the room may signal; anything else is dropped without
    /// an error, like a signal into an otherwise empty room.
    pub async fn relay_typing(&self, id: ConnectionId, project_id: Uuid, started: bool) -> usize {
        let room = RoomId::Project(project_id);
        let hub = self.registry.hub().read().await;
        let Some(identity) = typing_sender(&hub, id, room) else {
            tracing::debug!("[Rooms] Dropping typing signal from non-member {}", id);
            return 0;
        };

        let event = if started {
            ServerEvent::TypingStart
        } else {
            ServerEvent::TypingStop
        };
        let payload = serde_json::json!({
            "projectId": project_id,
            "userId": identity.id,
            "user": identity,
        });
        hub.deliver(room, &SocketFrame::new(event, payload), Some(id))
    }

    /// Connections currently in `room`
    pub async fn members(&self, room: RoomId) -> Vec<ConnectionId> {
        self.registry
            .hub()
            .read()
            .await
            .rooms
            .get(&room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn is_member(&self, id: ConnectionId, room: RoomId) -> bool {
        self.registry.hub().read().await.is_member(id, room)
    }
}

fn typing_sender(hub: &HubState, id: ConnectionId, room: RoomId) -> Option<Identity> {
    if !hub.is_member(id, room) {
        return None;
    }
    hub.connections.get(&id).map(|entry| entry.identity.clone())
}

fn presence_payload(identity: &Identity, room: RoomId) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "userId": identity.id,
        "user": identity,
        "room": room.to_string(),
    });
    if let Some(project_id) = room.project_id() {
        payload["projectId"] = serde_json::json!(project_id);
    }
    payload
}
