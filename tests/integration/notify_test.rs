//! Notification fan-out integration tests

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use collabhub::backend::error::BackendError;
use collabhub::backend::notify::{
    EmailJob, EmailQueue, MemoryWebhookDirectory, NotificationStore, WebhookDirectory,
    WebhookSubscription,
};
use collabhub::shared::entities::{EntitySummary, TaskStatus};
use collabhub::shared::notification::{EmailTemplate, NewNotification, NotificationType};
use collabhub::shared::{DomainEvent, DomainEventKind, NotificationRecord, ServerEvent};
use tokio::sync::Mutex;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{user, SocketProbe, TestApp};

#[derive(Default)]
struct RecordingEmail {
    jobs: Mutex<Vec<EmailJob>>,
}

#[async_trait]
impl EmailQueue for RecordingEmail {
    async fn queue_email(&self, job: EmailJob) -> Result<(), BackendError> {
        self.jobs.lock().await.push(job);
        Ok(())
    }
}

struct FailingEmail;

#[async_trait]
impl EmailQueue for FailingEmail {
    async fn queue_email(&self, _job: EmailJob) -> Result<(), BackendError> {
        Err(BackendError::delivery("email", "smtp down"))
    }
}

struct FailingWebhooks;

#[async_trait]
impl WebhookDirectory for FailingWebhooks {
    async fn list_active(&self, _event: &str) -> Result<Vec<WebhookSubscription>, BackendError> {
        Err(BackendError::state("directory offline"))
    }
}

struct FailingNotifications;

#[async_trait]
impl NotificationStore for FailingNotifications {
    async fn create(&self, _new: NewNotification) -> Result<NotificationRecord, BackendError> {
        Err(BackendError::state("database offline"))
    }

    async fn list_for_user(
        &self,
        _user_id: Uuid,
        _unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, BackendError> {
        Ok(Vec::new())
    }

    async fn mark_read(&self, _user_id: Uuid, _id: Uuid) -> Result<NotificationRecord, BackendError> {
        Err(BackendError::not_found("Notification not found"))
    }

    async fn mark_all_read(&self, _user_id: Uuid) -> Result<u64, BackendError> {
        Ok(0)
    }
}

fn task_summary() -> EntitySummary {
    EntitySummary {
        kind: collabhub::shared::EntityKind::Task,
        id: Uuid::new_v4(),
        title: "Write release notes".to_string(),
        project_id: Some(Uuid::new_v4()),
    }
}

#[tokio::test]
async fn test_record_persists_for_offline_target() {
    let app = TestApp::new();
    let target = Uuid::new_v4();
    let event = DomainEvent::new(DomainEventKind::TaskAssigned, Uuid::new_v4(), target, task_summary());

    let report = app.state.fanout.notify_with_report(&event).await.unwrap();
    assert_eq!(report.pushed, 0);
    assert!(!report.record.read);

    let stored = app.state.notifications.list_for_user(target, false).await.unwrap();
    assert_eq!(stored, vec![report.record]);
}

#[tokio::test]
async fn test_reassignment_notifies_new_assignee() {
    let app = TestApp::new();
    let (alice, bob, carol) = (user("Alice"), user("Bob"), user("Carol"));
    let project = app.seed_project(&alice, &[&bob, &carol]).await;
    let task = app.seed_task(&project, &alice, Some(&bob)).await;

    let mut c = SocketProbe::connect(&app, &carol).await;
    let mut b = SocketProbe::connect(&app, &bob).await;

    let event = DomainEvent::assignment_change(
        alice.id,
        Some(bob.id),
        Some(carol.id),
        EntitySummary::task(&task),
    )
    .unwrap();
    app.state.fanout.notify(&event).await.unwrap();

    let frame = c.expect_event(ServerEvent::Notification).await;
    crate::assert_contains!(frame.data["title"].as_str().unwrap(), "Write release notes");
    assert_eq!(frame.data["type"], "TASK_ASSIGNED");
    b.assert_silent();

    let records = app.state.notifications.list_for_user(carol.id, true).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(app.state.notifications.list_for_user(bob.id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_every_connection_of_target_receives_push() {
    let app = TestApp::new();
    let bob = user("Bob");
    let mut phone = SocketProbe::connect(&app, &bob).await;
    let mut laptop = SocketProbe::connect(&app, &bob).await;

    let event = DomainEvent::new(DomainEventKind::ProjectMemberAdded, Uuid::new_v4(), bob.id, task_summary());
    let report = app.state.fanout.notify_with_report(&event).await.unwrap();

    assert_eq!(report.pushed, 2);
    crate::assert_event!(phone.next_frame().await, ServerEvent::Notification);
    crate::assert_event!(laptop.next_frame().await, ServerEvent::Notification);
}

#[tokio::test]
async fn test_failing_sinks_do_not_fail_the_event() {
    let app = TestApp::with_collaborators(|c| {
        c.email = Arc::new(FailingEmail);
        c.webhooks = Arc::new(FailingWebhooks);
    });
    let target = user("Bob");
    let mut probe = SocketProbe::connect(&app, &target).await;

    let event = DomainEvent::new(DomainEventKind::IssueAssigned, Uuid::new_v4(), target.id, task_summary());
    let report = app.state.fanout.notify_with_report(&event).await.unwrap();

    assert!(!report.email_queued);
    assert_eq!(report.webhooks, 0);
    assert_eq!(report.pushed, 1);
    crate::assert_event!(probe.next_frame().await, ServerEvent::Notification);
    assert_eq!(
        app.state.notifications.list_for_user(target.id, false).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_store_failure_is_the_only_surfaced_error() {
    let app = TestApp::with_collaborators(|c| c.notifications = Arc::new(FailingNotifications));
    let target = user("Bob");
    let mut probe = SocketProbe::connect(&app, &target).await;

    let event = DomainEvent::new(DomainEventKind::TaskAssigned, Uuid::new_v4(), target.id, task_summary());
    let result = app.state.fanout.notify(&event).await;

    assert_matches!(result, Err(BackendError::StateError { .. }));
    probe.assert_silent();
}

#[tokio::test]
async fn test_email_job_uses_event_template() {
    let email = Arc::new(RecordingEmail::default());
    let shared = email.clone();
    let app = TestApp::with_collaborators(move |c| c.email = shared);
    let target = Uuid::new_v4();

    let event = DomainEvent::new(DomainEventKind::TaskAssigned, Uuid::new_v4(), target, task_summary());
    app.state.fanout.notify(&event).await.unwrap();

    let jobs = email.jobs.lock().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].template, EmailTemplate::TaskAssignment);
    assert_eq!(jobs[0].recipient_id, target);
    crate::assert_contains!(jobs[0].subject(), "Write release notes");
}

#[tokio::test]
async fn test_status_change_notifies_everyone_but_actor() {
    let app = TestApp::new();
    let (alice, bob) = (user("Alice"), user("Bob"));

    let events = DomainEvent::status_change(
        alice.id,
        DomainEventKind::TaskStatusChanged(TaskStatus::Done),
        vec![alice.id, bob.id],
        task_summary(),
    );
    let results = app.state.fanout.notify_all(&events).await;
    assert_eq!(results.len(), 1);

    let record = results.into_iter().next().unwrap().unwrap();
    assert_eq!(record.user_id, bob.id);
    assert_eq!(record.kind, NotificationType::StatusChange);
    assert!(app.state.notifications.list_for_user(alice.id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_matching_webhooks_receive_one_call_each() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/tasks"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let directory = Arc::new(MemoryWebhookDirectory::new());
    directory
        .insert(WebhookSubscription {
            id: Uuid::new_v4(),
            name: "tracker".to_string(),
            url: format!("{}/hooks/tasks", server.uri()),
            events: vec!["task.completed".to_string()],
            active: true,
            secret: None,
        })
        .await;
    directory
        .insert(WebhookSubscription {
            id: Uuid::new_v4(),
            name: "paused".to_string(),
            url: format!("{}/hooks/tasks", server.uri()),
            events: vec!["task.completed".to_string()],
            active: false,
            secret: None,
        })
        .await;
    let shared = directory.clone();
    let app = TestApp::with_collaborators(move |c| c.webhooks = shared);

    let event = DomainEvent::new(
        DomainEventKind::TaskStatusChanged(TaskStatus::Done),
        Uuid::new_v4(),
        Uuid::new_v4(),
        task_summary(),
    );
    let report = app.state.fanout.notify_with_report(&event).await.unwrap();
    assert_eq!(report.webhooks, 1);

    // delivery runs in the background
    let mut requests = Vec::new();
    for _ in 0..50 {
        requests = server.received_requests().await.unwrap_or_default();
        if !requests.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["event"], "task.completed");
    assert_eq!(body["payload"]["notificationId"], report.record.id.to_string());
}
