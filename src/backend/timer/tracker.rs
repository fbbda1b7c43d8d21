/**
 * Time Tracker
 *
 * Enforces at most one running timer per user.
 *
 * `start` and `stop` for the same user run one at a time behind a per-user
 * async mutex, so the read-then-write inside each call cannot interleave
 * with another call for that user. The store refuses duplicates on its own
 * as well, which covers several server processes sharing one database.
 *
 * Locks for users with no call in flight are dropped by `prune_idle`, which
 * the server's cleanup task runs periodically.
 */

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::timer::store::TimerStore;
use crate::shared::TimeEntry;

#[derive(Default)]
struct UserLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn lock_for(&self, user_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn prune_idle(&self) -> usize {
        let mut locks = self.locks.lock().await;
        let before = locks.len();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - locks.len()
    }

    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[derive(Clone)]
pub struct TimeTracker {
    store: Arc<dyn TimerStore>,
    locks: Arc<UserLocks>,
}

impl TimeTracker {
    pub fn new(store: Arc<dyn TimerStore>) -> Self {
        Self {
            store,
            locks: Arc::new(UserLocks::default()),
        }
    }

    /// Start a timer for `user_id` on `task_id`
    ///
    /// # Errors
    ///
    /// `Conflict` if the user already has a running timer; that timer is
    /// left untouched.
    pub async fn start(&self, user_id: Uuid, task_id: Uuid) -> Result<TimeEntry, BackendError> {
        let lock = self.locks.lock_for(user_id).await;
        let _held = lock.lock().await;

        if let Some(running) = self.store.running_for(user_id).await? {
            tracing::debug!(
                "[Timer] User {} already running {} on task {}",
                user_id,
                running.id,
                running.task_id
            );
            return Err(BackendError::conflict("A timer is already running"));
        }

        let entry = self
            .store
            .insert_running(TimeEntry::start(user_id, task_id, Utc::now()))
            .await?;
        tracing::info!("[Timer] User {} started {} on task {}", user_id, entry.id, task_id);
        Ok(entry)
    }

    /// Stop the user's running timer
    ///
    /// # Errors
    ///
    /// `NotFound` if nothing is running.
    pub async fn stop(&self, user_id: Uuid) -> Result<TimeEntry, BackendError> {
        let lock = self.locks.lock_for(user_id).await;
        let _held = lock.lock().await;

        let running = self
            .store
            .running_for(user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("No active timer"))?;
        let entry = self.store.close(running.stop_at(Utc::now())).await?;
        tracing::info!(
            "[Timer] User {} stopped {} after {}s",
            user_id,
            entry.id,
            entry.duration_seconds.unwrap_or_default()
        );
        Ok(entry)
    }

    pub async fn active(&self, user_id: Uuid) -> Result<Option<TimeEntry>, BackendError> {
        self.store.running_for(user_id).await
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<TimeEntry>, BackendError> {
        self.store.entries_for(user_id).await
    }

    /// Drop per-user locks that nobody holds; returns how many were removed
    pub async fn prune_idle(&self) -> usize {
        self.locks.prune_idle().await
    }

    pub async fn tracked_users(&self) -> usize {
        self.locks.len().await
    }
}
