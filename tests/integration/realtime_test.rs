//! Connection registry and room manager integration tests

use collabhub::backend::error::BackendError;
use collabhub::backend::realtime::{JoinOutcome, RoomId};
use collabhub::shared::event::ProjectRef;
use collabhub::shared::{ClientCommand, ServerEvent};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::common::{user, SocketProbe, TestApp};

fn join(project_id: Uuid) -> ClientCommand {
    ClientCommand::JoinProject(ProjectRef { project_id })
}

#[tokio::test]
async fn test_invalid_token_is_rejected_with_error_frame() {
    let app = TestApp::new();
    let (tx, mut rx) = mpsc::channel(8);

    let result = app.state.registry.admit("not-a-jwt", tx).await;
    crate::assert_err!(result, BackendError::Authentication { .. });

    let frame = rx.recv().await.unwrap();
    crate::assert_event!(frame, ServerEvent::Error);
    assert_eq!(app.state.registry.connection_count().await, 0);
}

#[tokio::test]
async fn test_admitted_connection_is_in_private_room() {
    let app = TestApp::new();
    let alice = user("Alice");
    let probe = SocketProbe::connect(&app, &alice).await;

    let identity = app.state.registry.lookup(probe.id).await.unwrap();
    assert_eq!(identity.id, alice.id);
    assert_eq!(
        app.state.registry.rooms_of(probe.id).await,
        vec![RoomId::User(alice.id)]
    );
    assert!(app.state.registry.is_online(alice.id).await);
}

#[tokio::test]
async fn test_remove_is_idempotent_and_clears_lookup() {
    let app = TestApp::new();
    let alice = user("Alice");
    let probe = SocketProbe::connect(&app, &alice).await;

    assert!(app.state.registry.remove(probe.id).await.is_some());
    assert!(app.state.registry.lookup(probe.id).await.is_none());
    assert!(app.state.registry.remove(probe.id).await.is_none());
    assert!(!app.state.registry.is_online(alice.id).await);
    assert!(app.state.rooms.members(RoomId::User(alice.id)).await.is_empty());
}

#[tokio::test]
async fn test_member_chat_and_outsider_rejection() {
    let app = TestApp::new();
    let (alice, bob, carol) = (user("Alice"), user("Bob"), user("Carol"));
    let project = app.seed_project(&alice, &[&bob]).await;

    let mut a = SocketProbe::connect(&app, &alice).await;
    let mut b = SocketProbe::connect(&app, &bob).await;
    let mut c = SocketProbe::connect(&app, &carol).await;

    a.send(&app, join(project.id)).await;
    b.send(&app, join(project.id)).await;
    let joined = a.expect_event(ServerEvent::UserJoined).await;
    assert_eq!(joined.data["userId"], bob.id.to_string());

    c.send(&app, join(project.id)).await;
    let error = c.expect_event(ServerEvent::Error).await;
    crate::assert_contains!(error.data["message"].as_str().unwrap(), "Access denied");
    assert!(!app.state.rooms.is_member(c.id, RoomId::Project(project.id)).await);

    let text = format!(
        r#"{{"event":"send-message","data":{{"projectId":"{}","content":"hi"}}}}"#,
        project.id
    );
    a.send_text(&app, &text).await;

    let message = b.expect_event(ServerEvent::NewMessage).await;
    assert_eq!(message.data["content"], "hi");
    assert_eq!(message.data["sender"]["id"], alice.id.to_string());
    assert_eq!(message.data["projectId"], project.id.to_string());

    // the outsider never sees room traffic
    assert!(c.drain().iter().all(|f| !f.is(ServerEvent::NewMessage)));
}

#[tokio::test]
async fn test_broadcast_reaches_every_member_once() {
    let app = TestApp::new();
    let owner = user("Owner");
    let members: Vec<_> = (0..4).map(|i| user(&format!("Member{}", i))).collect();
    let member_refs: Vec<_> = members.iter().collect();
    let project = app.seed_project(&owner, &member_refs).await;
    let room = RoomId::Project(project.id);

    let mut probes = Vec::new();
    for member in &members {
        let probe = SocketProbe::connect(&app, member).await;
        assert_eq!(app.state.rooms.join(probe.id, room).await.unwrap(), JoinOutcome::Joined);
        probes.push(probe);
    }
    for probe in probes.iter_mut() {
        probe.drain();
    }

    let delivered = app
        .state
        .rooms
        .broadcast(room, ServerEvent::ProjectUpdate, serde_json::json!({ "n": 1 }))
        .await;
    assert_eq!(delivered, members.len());

    for probe in probes.iter_mut() {
        let frames = probe.drain();
        assert_eq!(frames.len(), 1);
        crate::assert_event!(frames[0], ServerEvent::ProjectUpdate);
    }
}

#[tokio::test]
async fn test_join_twice_reports_already_member() {
    let app = TestApp::new();
    let alice = user("Alice");
    let project = app.seed_project(&alice, &[]).await;
    let probe = SocketProbe::connect(&app, &alice).await;
    let room = RoomId::Project(project.id);

    assert_eq!(app.state.rooms.join(probe.id, room).await.unwrap(), JoinOutcome::Joined);
    assert_eq!(
        app.state.rooms.join(probe.id, room).await.unwrap(),
        JoinOutcome::AlreadyMember
    );
    assert_eq!(app.state.rooms.members(room).await.len(), 1);
}

#[tokio::test]
async fn test_join_unknown_project_is_not_found() {
    let app = TestApp::new();
    let alice = user("Alice");
    let probe = SocketProbe::connect(&app, &alice).await;

    let result = app
        .state
        .rooms
        .join(probe.id, RoomId::Project(Uuid::new_v4()))
        .await;
    crate::assert_err!(result, BackendError::NotFound { .. });
}

#[tokio::test]
async fn test_cannot_join_another_users_room() {
    let app = TestApp::new();
    let (alice, bob) = (user("Alice"), user("Bob"));
    let probe = SocketProbe::connect(&app, &alice).await;

    let result = app.state.rooms.join(probe.id, RoomId::User(bob.id)).await;
    crate::assert_err!(result, BackendError::Authorization { .. });
}

#[tokio::test]
async fn test_join_after_disconnect_is_discarded() {
    let app = TestApp::new();
    let alice = user("Alice");
    let project = app.seed_project(&alice, &[]).await;
    let probe = SocketProbe::connect(&app, &alice).await;
    app.state.rooms.disconnect(probe.id).await;

    let result = app.state.rooms.join(probe.id, RoomId::Project(project.id)).await;
    crate::assert_err!(result, BackendError::NotFound { .. });
    assert!(app.state.rooms.members(RoomId::Project(project.id)).await.is_empty());
}

#[tokio::test]
async fn test_leave_notifies_remaining_members() {
    let app = TestApp::new();
    let (alice, bob) = (user("Alice"), user("Bob"));
    let project = app.seed_project(&alice, &[&bob]).await;
    let room = RoomId::Project(project.id);

    let mut a = SocketProbe::connect(&app, &alice).await;
    let b = SocketProbe::connect(&app, &bob).await;
    app.state.rooms.join(a.id, room).await.unwrap();
    app.state.rooms.join(b.id, room).await.unwrap();
    a.drain();

    assert!(app.state.rooms.leave(b.id, room).await);
    assert!(!app.state.rooms.leave(b.id, room).await);

    let left = a.expect_event(ServerEvent::UserLeft).await;
    assert_eq!(left.data["userId"], bob.id.to_string());
}

#[tokio::test]
async fn test_user_left_waits_for_last_connection_of_user() {
    let app = TestApp::new();
    let (alice, bob) = (user("Alice"), user("Bob"));
    let project = app.seed_project(&alice, &[&bob]).await;
    let room = RoomId::Project(project.id);

    let mut a = SocketProbe::connect(&app, &alice).await;
    let b1 = SocketProbe::connect(&app, &bob).await;
    let b2 = SocketProbe::connect(&app, &bob).await;
    for id in [a.id, b1.id, b2.id] {
        app.state.rooms.join(id, room).await.unwrap();
    }
    a.drain();

    app.state.rooms.disconnect(b1.id).await;
    a.assert_silent();

    app.state.rooms.disconnect(b2.id).await;
    let left = a.expect_event(ServerEvent::UserLeft).await;
    assert_eq!(left.data["userId"], bob.id.to_string());
}

#[tokio::test]
async fn test_typing_relayed_to_others_only() {
    let app = TestApp::new();
    let (alice, bob, carol) = (user("Alice"), user("Bob"), user("Carol"));
    let project = app.seed_project(&alice, &[&bob]).await;
    let room = RoomId::Project(project.id);

    let mut a = SocketProbe::connect(&app, &alice).await;
    let mut b = SocketProbe::connect(&app, &bob).await;
    let mut c = SocketProbe::connect(&app, &carol).await;
    app.state.rooms.join(a.id, room).await.unwrap();
    app.state.rooms.join(b.id, room).await.unwrap();
    a.drain();
    b.drain();

    a.send(&app, ClientCommand::TypingStart(ProjectRef { project_id: project.id }))
        .await;
    let typing = b.expect_event(ServerEvent::TypingStart).await;
    assert_eq!(typing.data["userId"], alice.id.to_string());
    assert_eq!(typing.data["user"]["email"], alice.email);
    a.assert_silent();

    // non-members are dropped without an error
    c.send(&app, ClientCommand::TypingStop(ProjectRef { project_id: project.id }))
        .await;
    b.assert_silent();
    c.assert_silent();
}

#[tokio::test]
async fn test_broadcast_to_offline_user_is_noop() {
    let app = TestApp::new();
    let delivered = app
        .state
        .rooms
        .broadcast_to_user(Uuid::new_v4(), ServerEvent::Notification, serde_json::json!({}))
        .await;
    assert_eq!(delivered, 0);
}

#[tokio::test]
async fn test_malformed_frame_errors_only_to_sender() {
    let app = TestApp::new();
    let (alice, bob) = (user("Alice"), user("Bob"));
    let mut a = SocketProbe::connect(&app, &alice).await;
    let mut b = SocketProbe::connect(&app, &bob).await;

    a.send_text(&app, "{not json").await;
    crate::assert_event!(a.next_frame().await, ServerEvent::Error);
    b.assert_silent();
}

mod pending_authorization {
    use std::sync::Arc;

    use async_trait::async_trait;
    use collabhub::backend::access::AccessViewSource;
    use collabhub::backend::error::BackendError;
    use collabhub::backend::realtime::{JoinOutcome, RoomId};
    use collabhub::shared::{AccessView, EntityKind};
    use tokio::sync::Notify;
    use uuid::Uuid;

    use crate::common::{user, SocketProbe, TestApp};

    /// Holds every lookup until released
    struct GatedAccess {
        inner: Arc<dyn AccessViewSource>,
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AccessViewSource for GatedAccess {
        async fn access_view(
            &self,
            kind: EntityKind,
            id: Uuid,
        ) -> Result<Option<AccessView>, BackendError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.access_view(kind, id).await
        }
    }

    #[tokio::test]
    async fn test_join_resolving_after_disconnect_is_discarded() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let (gate_entered, gate_release) = (entered.clone(), release.clone());
        let app = TestApp::with_collaborators(move |c| {
            c.access = Arc::new(GatedAccess {
                inner: c.access.clone(),
                entered: gate_entered,
                release: gate_release,
            });
        });

        let alice = user("Alice");
        let project = app.seed_project(&alice, &[]).await;
        let probe = SocketProbe::connect(&app, &alice).await;
        let room = RoomId::Project(project.id);

        let rooms = app.state.rooms.clone();
        let id = probe.id;
        let pending = tokio::spawn(async move { rooms.join(id, room).await });

        entered.notified().await;
        app.state.rooms.disconnect(probe.id).await;
        release.notify_one();

        assert_eq!(pending.await.unwrap().unwrap(), JoinOutcome::Discarded);
        assert!(app.state.rooms.members(room).await.is_empty());
    }
}
