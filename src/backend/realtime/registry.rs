/**
 * Connection Registry
 *
 * Tracks live authenticated connections. A connection is only ever created
 * after its handshake token verifies; a failed handshake leaves nothing
 * behind.
 *
 * # Lifecycle
 *
 * ```text
 * Connecting ──verified──▶ Authenticated ──remove──▶ Disconnected
 *     │                                                  ▲
 *     └──────────────verification failed─────────────────┘
 * ```
 *
 * There is no retry at this layer: a client whose token was rejected must
 * reconnect with a fresh token.
 *
 * # Multi-device
 *
 * One identity may hold any number of connections. Every operation is keyed
 * by connection id, so removing one device never touches its siblings.
 */

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::auth::TokenVerifier;
use crate::backend::error::BackendError;
use crate::backend::realtime::hub::{
    ConnectionEntry, ConnectionId, FrameSender, HubState, RoomId,
};
use crate::shared::{Identity, SocketFrame};

/// An admitted connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub identity: Identity,
}

/// Registry of live connections
///
/// Cheap to clone; clones share the same state. Construct one per process
/// (or one per test).
#[derive(Clone)]
pub struct ConnectionRegistry {
    hub: Arc<RwLock<HubState>>,
    verifier: Arc<dyn TokenVerifier>,
}

impl ConnectionRegistry {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            hub: Arc::new(RwLock::new(HubState::default())),
            verifier,
        }
    }

    pub(crate) fn hub(&self) -> &Arc<RwLock<HubState>> {
        &self.hub
    }

    /// Admit a connection from its handshake token
    ///
    /// On success the connection is registered, joined to its private
    /// `user:<id>` room and sent a `connected` acknowledgement. On failure an
    /// `error` frame is queued on `outbound`, nothing is retained and the
    /// caller must close the transport.
    ///
    /// # Errors
    ///
    /// `BackendError::Authentication` if the token does not verify.
    pub async fn admit(
        &self,
        raw_token: &str,
        outbound: FrameSender,
    ) -> Result<Connection, BackendError> {
        let identity = match self.verifier.verify_token(raw_token).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::info!("[Realtime] Handshake rejected: {}", err);
                let _ = outbound.try_send(err.to_frame());
                return Err(err);
            }
        };

        let id = ConnectionId::new();
        let ack = SocketFrame::connected(identity.id);
        {
            let mut hub = self.hub.write().await;
            hub.connections.insert(
                id,
                ConnectionEntry {
                    identity: identity.clone(),
                    outbound,
                    rooms: HashSet::new(),
                },
            );
            hub.add_member(id, RoomId::User(identity.id));
            if let Some(entry) = hub.connections.get(&id) {
                entry.push(id, ack);
            }
        }

        tracing::info!("[Realtime] Connection {} admitted for user {}", id, identity.id);
        Ok(Connection { id, identity })
    }

    /// Remove a connection and all of its memberships
    ///
    /// Idempotent: returns the identity the first time, `None` afterwards.
    pub async fn remove(&self, id: ConnectionId) -> Option<Identity> {
        let entry = self.hub.write().await.remove_connection(id)?;
        tracing::info!(
            "[Realtime] Connection {} removed (user {})",
            id,
            entry.identity.id
        );
        Some(entry.identity)
    }

    pub async fn lookup(&self, id: ConnectionId) -> Option<Identity> {
        self.hub
            .read()
            .await
            .connections
            .get(&id)
            .map(|entry| entry.identity.clone())
    }

    /// Queue a frame for one connection; false if unknown or dropped
    pub async fn send_to(&self, id: ConnectionId, frame: SocketFrame) -> bool {
        let hub = self.hub.read().await;
        hub.connections
            .get(&id)
            .map(|entry| entry.push(id, frame))
            .unwrap_or(false)
    }

    /// Rooms a connection currently belongs to
    pub async fn rooms_of(&self, id: ConnectionId) -> Vec<RoomId> {
        self.hub
            .read()
            .await
            .connections
            .get(&id)
            .map(|entry| entry.rooms.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Live connections of one user
    pub async fn connections_of(&self, user_id: Uuid) -> Vec<ConnectionId> {
        self.hub
            .read()
            .await
            .connections
            .iter()
            .filter(|(_, entry)| entry.identity.id == user_id)
            .map(|(id, _)| *id)
            .collect()
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.hub.read().await.user_present_in(user_id, RoomId::User(user_id))
    }

    pub async fn connection_count(&self) -> usize {
        self.hub.read().await.connections.len()
    }
}
