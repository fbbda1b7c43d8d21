/**
 * Socket Command Dispatch
 *
 * Turns decoded client commands into room operations. Each inbound frame is
 * one unit of work; the socket reader awaits a unit before reading the next
 * frame, so commands from one connection are handled in arrival order while
 * different connections proceed concurrently.
 *
 * Every failure is reported as an `error` frame to the originating
 * connection only.
 */

use std::sync::Arc;

use crate::backend::access::AccessGuard;
use crate::backend::chat::MessageStore;
use crate::backend::error::BackendError;
use crate::backend::realtime::hub::{ConnectionId, RoomId};
use crate::backend::realtime::rooms::RoomManager;
use crate::shared::{ChatMessage, ClientCommand, EntityKind, SendMessageRequest, ServerEvent};

#[derive(Clone)]
pub struct CommandDispatcher {
    rooms: RoomManager,
    guard: AccessGuard,
    messages: Arc<dyn MessageStore>,
}

impl CommandDispatcher {
    pub fn new(rooms: RoomManager, guard: AccessGuard, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            rooms,
            guard,
            messages,
        }
    }

    /// Decode and handle one text frame, reporting failures to the sender
    pub async fn handle_text(&self, id: ConnectionId, text: &str) {
        let result = match ClientCommand::from_text(text) {
            Ok(command) => self.dispatch(id, command).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = result {
            tracing::debug!("[Realtime] Command from {} failed: {}", id, err);
            self.rooms.registry().send_to(id, err.to_frame()).await;
        }
    }

    pub async fn dispatch(&self, id: ConnectionId, command: ClientCommand) -> Result<(), BackendError> {
        tracing::debug!("[Realtime] {} -> {}", id, command.name());
        match command {
            ClientCommand::JoinProject(project) => {
                self.rooms.join(id, RoomId::Project(project.project_id)).await?;
            }
            ClientCommand::LeaveProject(project) => {
                self.rooms.leave(id, RoomId::Project(project.project_id)).await;
            }
            ClientCommand::SendMessage(request) => {
                self.send_message(id, request).await?;
            }
            ClientCommand::TypingStart(project) => {
                self.rooms.relay_typing(id, project.project_id, true).await;
            }
            ClientCommand::TypingStop(project) => {
                self.rooms.relay_typing(id, project.project_id, false).await;
            }
        }
        Ok(())
    }

    /// Authorize, persist, then broadcast `new-message` to the project room
    ///
    /// Returns `None` when the sender disconnected before the authorization
    /// lookup resolved; nothing is stored in that case.
    pub async fn send_message(
        &self,
        id: ConnectionId,
        request: SendMessageRequest,
    ) -> Result<Option<ChatMessage>, BackendError> {
        request.validate()?;
        let registry = self.rooms.registry();
        let sender = registry
            .lookup(id)
            .await
            .ok_or_else(|| BackendError::not_found("Connection not found"))?;

        self.guard
            .authorize(&sender, EntityKind::Project, request.project_id)
            .await?;
        if registry.lookup(id).await.is_none() {
            tracing::debug!("[Realtime] {} left before send-message resolved", id);
            return Ok(None);
        }

        let message = self.messages.persist_message(&request, &sender).await?;
        let delivered = self
            .rooms
            .broadcast(
                RoomId::Project(request.project_id),
                ServerEvent::NewMessage,
                serde_json::to_value(&message)?,
            )
            .await;
        tracing::info!(
            "[Realtime] Message {} in project {} delivered to {} connections",
            message.id,
            request.project_id,
            delivered
        );
        Ok(Some(message))
    }
}
