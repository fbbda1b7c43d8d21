//! Time tracking integration tests

use std::sync::Arc;

use collabhub::backend::error::BackendError;
use collabhub::backend::timer::{MemoryTimerStore, TimeTracker, TimerStore};
use futures_util::future::join_all;
use uuid::Uuid;

use crate::common::TestApp;

#[tokio::test]
async fn test_concurrent_starts_leave_one_running_timer() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    let attempts = (0..16).map(|_| {
        let timers = app.state.timers.clone();
        tokio::spawn(async move { timers.start(user, Uuid::new_v4()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let started: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(started.len(), 1);
    assert!(results
        .iter()
        .filter(|r| r.is_err())
        .all(|r| matches!(r, Err(BackendError::Conflict { .. }))));

    let active = app.state.timers.active(user).await.unwrap().unwrap();
    assert_eq!(active.id, started[0].id);
}

#[tokio::test]
async fn test_conflict_leaves_existing_timer_untouched() {
    let app = TestApp::new();
    let user = Uuid::new_v4();
    let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());

    let running = app.state.timers.start(user, t2).await.unwrap();
    let result = app.state.timers.start(user, t1).await;
    crate::assert_err!(result, BackendError::Conflict { .. });

    let active = app.state.timers.active(user).await.unwrap().unwrap();
    assert_eq!(active, running);
    assert_eq!(active.task_id, t2);
}

#[tokio::test]
async fn test_stop_then_start_again() {
    let app = TestApp::new();
    let user = Uuid::new_v4();

    crate::assert_err!(app.state.timers.stop(user).await, BackendError::NotFound { .. });

    app.state.timers.start(user, Uuid::new_v4()).await.unwrap();
    let stopped = app.state.timers.stop(user).await.unwrap();
    assert!(stopped.end_time.is_some());
    assert!(stopped.duration_seconds.unwrap() >= 0);

    app.state.timers.start(user, Uuid::new_v4()).await.unwrap();
    assert_eq!(app.state.timers.history(user).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_users_are_independent() {
    let app = TestApp::new();
    let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
    let task = Uuid::new_v4();

    app.state.timers.start(u1, task).await.unwrap();
    app.state.timers.start(u2, task).await.unwrap();
    assert!(app.state.timers.active(u1).await.unwrap().is_some());
    assert!(app.state.timers.active(u2).await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_refuses_duplicates_across_trackers() {
    // two trackers sharing one store, as two server processes share a database
    let store: Arc<dyn TimerStore> = Arc::new(MemoryTimerStore::new());
    let first = TimeTracker::new(store.clone());
    let second = TimeTracker::new(store.clone());
    let user = Uuid::new_v4();

    let (a, b) = tokio::join!(
        first.start(user, Uuid::new_v4()),
        second.start(user, Uuid::new_v4())
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert!(store.running_for(user).await.unwrap().is_some());
}
