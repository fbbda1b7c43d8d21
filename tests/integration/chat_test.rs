//! Project chat integration tests

use std::sync::Arc;

use async_trait::async_trait;
use collabhub::backend::chat::{MemoryMessageStore, MessageStore};
use collabhub::backend::error::BackendError;
use collabhub::backend::realtime::RoomId;
use collabhub::shared::{ChatMessage, Identity, SendMessageRequest, ServerEvent};
use uuid::Uuid;

use crate::common::{user, SocketProbe, TestApp};

fn send_message(project_id: Uuid, content: &str) -> String {
    serde_json::json!({
        "event": "send-message",
        "data": { "projectId": project_id, "content": content }
    })
    .to_string()
}

struct FailingStore;

#[async_trait]
impl MessageStore for FailingStore {
    async fn persist_message(
        &self,
        _request: &SendMessageRequest,
        _sender: &Identity,
    ) -> Result<ChatMessage, BackendError> {
        Err(BackendError::state("store offline"))
    }

    async fn recent_messages(
        &self,
        _project_id: Uuid,
        _limit: usize,
    ) -> Result<Vec<ChatMessage>, BackendError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_message_is_stored_before_broadcast() {
    let store = Arc::new(MemoryMessageStore::new());
    let shared = store.clone();
    let app = TestApp::with_collaborators(move |c| c.messages = shared);

    let alice = user("Alice");
    let project = app.seed_project(&alice, &[]).await;
    let mut a = SocketProbe::connect(&app, &alice).await;
    app.state.rooms.join(a.id, RoomId::Project(project.id)).await.unwrap();

    a.send_text(&app, &send_message(project.id, "stored")).await;
    let frame = a.expect_event(ServerEvent::NewMessage).await;

    let stored = store.recent_messages(project.id, 10).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(frame.data["id"], stored[0].id.to_string());
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let app = TestApp::new();
    let alice = user("Alice");
    let project = app.seed_project(&alice, &[]).await;
    let mut a = SocketProbe::connect(&app, &alice).await;
    app.state.rooms.join(a.id, RoomId::Project(project.id)).await.unwrap();

    a.send_text(&app, &send_message(project.id, "   ")).await;
    let error = a.next_frame().await;
    crate::assert_event!(error, ServerEvent::Error);
    crate::assert_contains!(error.data["message"].as_str().unwrap(), "empty");
}

#[tokio::test]
async fn test_outsider_cannot_post_into_project() {
    let app = TestApp::new();
    let (alice, mallory) = (user("Alice"), user("Mallory"));
    let project = app.seed_project(&alice, &[]).await;
    let mut a = SocketProbe::connect(&app, &alice).await;
    let mut m = SocketProbe::connect(&app, &mallory).await;
    app.state.rooms.join(a.id, RoomId::Project(project.id)).await.unwrap();

    m.send_text(&app, &send_message(project.id, "spam")).await;
    crate::assert_event!(m.next_frame().await, ServerEvent::Error);
    a.assert_silent();
}

#[tokio::test]
async fn test_store_failure_reports_error_and_skips_broadcast() {
    let app = TestApp::with_collaborators(|c| c.messages = Arc::new(FailingStore));
    let (alice, bob) = (user("Alice"), user("Bob"));
    let project = app.seed_project(&alice, &[&bob]).await;
    let mut a = SocketProbe::connect(&app, &alice).await;
    let mut b = SocketProbe::connect(&app, &bob).await;
    let room = RoomId::Project(project.id);
    app.state.rooms.join(a.id, room).await.unwrap();
    app.state.rooms.join(b.id, room).await.unwrap();
    a.drain();

    a.send_text(&app, &send_message(project.id, "lost")).await;
    crate::assert_event!(a.next_frame().await, ServerEvent::Error);
    b.assert_silent();
}
