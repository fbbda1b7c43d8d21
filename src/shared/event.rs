/**
 * Real-time Socket Protocol
 *
 * This module defines the frames exchanged over a collaboration socket.
 * Every frame is a JSON object with an event name and a payload:
 *
 * ```json
 * {"event": "join-project", "data": {"projectId": "..."}}
 * ```
 *
 * Inbound frames are decoded into `ClientCommand`; outbound frames are built
 * from a `ServerEvent` name and an arbitrary JSON payload.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::message::SendMessageRequest;
use crate::shared::SharedError;

/// Events the server emits to connections
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Handshake accepted
    Connected,
    /// Authentication, authorization or request failure
    Error,
    UserJoined,
    UserLeft,
    NewMessage,
    TypingStart,
    TypingStop,
    /// Personal notification pushed to `user:<id>`
    Notification,
    /// Generic project room broadcast
    ProjectUpdate,
}

impl ServerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Error => "error",
            Self::UserJoined => "user-joined",
            Self::UserLeft => "user-left",
            Self::NewMessage => "new-message",
            Self::TypingStart => "typing-start",
            Self::TypingStop => "typing-stop",
            Self::Notification => "notification",
            Self::ProjectUpdate => "project-update",
        }
    }
}

impl std::fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single frame on the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SocketFrame {
    pub fn new(event: ServerEvent, data: serde_json::Value) -> Self {
        Self {
            event: event.as_str().to_string(),
            data,
        }
    }

    /// Handshake acknowledgement
    pub fn connected(user_id: Uuid) -> Self {
        Self::new(ServerEvent::Connected, serde_json::json!({ "userId": user_id }))
    }

    /// Error frame, delivered to the originating connection only
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(
            ServerEvent::Error,
            serde_json::json!({ "message": message.into() }),
        )
    }

    pub fn is(&self, event: ServerEvent) -> bool {
        self.event == event.as_str()
    }

    pub fn to_json(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Payload naming a project room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub project_id: Uuid,
}

/// Commands a connection may send
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientCommand {
    JoinProject(ProjectRef),
    LeaveProject(ProjectRef),
    SendMessage(SendMessageRequest),
    TypingStart(ProjectRef),
    TypingStop(ProjectRef),
}

impl ClientCommand {
    /// Decode a text frame
    pub fn from_text(text: &str) -> Result<Self, SharedError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Event name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinProject(_) => "join-project",
            Self::LeaveProject(_) => "leave-project",
            Self::SendMessage(_) => "send-message",
            Self::TypingStart(_) => "typing-start",
            Self::TypingStop(_) => "typing-stop",
        }
    }
}
