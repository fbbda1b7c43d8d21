//! HTTP route integration tests

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use collabhub::backend::realtime::RoomId;
use collabhub::backend::routes::create_router;
use collabhub::shared::{DomainEvent, DomainEventKind, EntitySummary, Identity, ServerEvent};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::ServiceExt;
use uuid::Uuid;

use crate::common::{mint_token, user, SocketProbe, TestApp};

async fn call(
    router: &Router,
    method: Method,
    uri: &str,
    caller: Option<&Identity>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = caller {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", mint_token(identity)));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_health_reports_connections() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let _probe = SocketProbe::connect(&app, &user("Alice")).await;

    let (status, body) = call(&router, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 1);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());

    let (status, body) = call(&router, Method::GET, "/api/notifications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let (status, _) = call(&router, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_notification_read_flow() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let (alice, bob) = (user("Alice"), user("Bob"));
    let project = app.seed_project(&alice, &[&bob]).await;
    let task = app.seed_task(&project, &alice, Some(&bob)).await;

    let event = DomainEvent::new(
        DomainEventKind::TaskAssigned,
        alice.id,
        bob.id,
        EntitySummary::task(&task),
    );
    let record = app.state.fanout.notify(&event).await.unwrap();

    let (status, list) = call(&router, Method::GET, "/api/notifications?unreadOnly=true", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], record.id.to_string());

    let uri = format!("/api/notifications/{}/read", record.id);
    let (status, _) = call(&router, Method::POST, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, read) = call(&router, Method::POST, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["read"], true);

    let (status, updated) = call(&router, Method::POST, "/api/notifications/read-all", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["updated"], 0);
}

#[tokio::test]
async fn test_timer_routes() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let (alice, mallory) = (user("Alice"), user("Mallory"));
    let project = app.seed_project(&alice, &[]).await;
    let task = app.seed_task(&project, &alice, None).await;
    let start = serde_json::json!({ "taskId": task.id });

    let (status, entry) = call(&router, Method::POST, "/api/timers/start", Some(&alice), Some(start.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["taskId"], task.id.to_string());

    let (status, _) = call(&router, Method::POST, "/api/timers/start", Some(&alice), Some(start.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(&router, Method::POST, "/api/timers/start", Some(&mallory), Some(start)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let unknown = serde_json::json!({ "taskId": Uuid::new_v4() });
    let (status, _) = call(&router, Method::POST, "/api/timers/start", Some(&alice), Some(unknown)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, active) = call(&router, Method::GET, "/api/timers/active", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["id"], entry["id"]);

    let (status, stopped) = call(&router, Method::POST, "/api/timers/stop", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stopped["endTime"].is_string());

    let (status, _) = call(&router, Method::POST, "/api/timers/stop", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, active) = call(&router, Method::GET, "/api/timers/active", Some(&alice), None).await;
    assert!(active.is_null());
}

#[tokio::test]
async fn test_project_update_broadcast() {
    let app = TestApp::new();
    let router = create_router(app.state.clone());
    let (alice, bob, mallory) = (user("Alice"), user("Bob"), user("Mallory"));
    let project = app.seed_project(&alice, &[&bob]).await;

    let mut b = SocketProbe::connect(&app, &bob).await;
    app.state.rooms.join(b.id, RoomId::Project(project.id)).await.unwrap();

    let uri = format!("/api/projects/{}/updates", project.id);
    let update = serde_json::json!({ "type": "task-moved", "data": { "column": "done" } });

    let (status, _) = call(&router, Method::POST, &uri, Some(&mallory), Some(update.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    b.assert_silent();

    let (status, body) = call(&router, Method::POST, &uri, Some(&alice), Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 1);

    let frame = b.expect_event(ServerEvent::ProjectUpdate).await;
    assert_eq!(frame.data["type"], "task-moved");
    assert_eq!(frame.data["data"]["column"], "done");
}
