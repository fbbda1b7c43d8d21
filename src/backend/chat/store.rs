/**
 * Chat Message Store
 *
 * `persistMessage` collaborator: a message is stored before it is broadcast,
 * so every room member receives the stored record.
 */

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::{ChatMessage, Identity, SendMessageRequest};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a validated message on behalf of `sender`
    async fn persist_message(
        &self,
        request: &SendMessageRequest,
        sender: &Identity,
    ) -> Result<ChatMessage, BackendError>;

    /// Most recent messages of a project, oldest first
    async fn recent_messages(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, BackendError>;
}

/// Process-local message store
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    messages: RwLock<Vec<ChatMessage>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn persist_message(
        &self,
        request: &SendMessageRequest,
        sender: &Identity,
    ) -> Result<ChatMessage, BackendError> {
        let message = ChatMessage::from_request(request, sender.clone());
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn recent_messages(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, BackendError> {
        let messages = self.messages.read().await;
        let mut recent: Vec<ChatMessage> = messages
            .iter()
            .rev()
            .filter(|m| m.project_id == project_id)
            .take(limit)
            .cloned()
            .collect();
        recent.reverse();
        Ok(recent)
    }
}
