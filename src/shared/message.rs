/**
 * Project Chat Messages
 *
 * Messages sent into a project room. A message is persisted by the message
 * store collaborator before it is broadcast as `new-message`, so the payload
 * every room member receives is the stored record, sender included.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::identity::Identity;
use crate::shared::SharedError;

/// Longest accepted message body, in characters
pub const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    File,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::File => "FILE",
            Self::System => "SYSTEM",
        }
    }
}

impl std::str::FromStr for MessageType {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "FILE" => Ok(Self::File),
            "SYSTEM" => Ok(Self::System),
            _ => Err(SharedError::parse("message type", s)),
        }
    }
}

/// Inbound `send-message` payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub project_id: Uuid,
    pub content: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<MessageType>,
}

impl SendMessageRequest {
    /// Reject empty or oversized bodies
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.content.trim().is_empty() {
            return Err(SharedError::validation(
                "content",
                "Message content cannot be empty",
            ));
        }
        if self.content.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(SharedError::validation(
                "content",
                format!("Message content exceeds {} characters", MAX_MESSAGE_LENGTH),
            ));
        }
        Ok(())
    }
}

/// A persisted chat message, as broadcast in `new-message`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub project_id: Uuid,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub sender: Identity,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build the record for a validated request
    pub fn from_request(request: &SendMessageRequest, sender: Identity) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: request.project_id,
            content: request.content.clone(),
            message_type: request.message_type.unwrap_or_default(),
            sender,
            created_at: Utc::now(),
        }
    }
}
