/**
 * Timer Store
 *
 * Persistence for time entries. Implementations must refuse a second
 * running entry for the same user on their own, independent of the
 * tracker's per-user lock: the Postgres store relies on a partial unique
 * index, the memory store checks under its write lock.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::TimeEntry;

#[async_trait]
pub trait TimerStore: Send + Sync {
    /// The user's running entry, if any
    async fn running_for(&self, user_id: Uuid) -> Result<Option<TimeEntry>, BackendError>;

    /// Store a new running entry
    ///
    /// # Errors
    ///
    /// `Conflict` when the user already has a running entry.
    async fn insert_running(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError>;

    /// Persist the end time and duration of a running entry
    ///
    /// # Errors
    ///
    /// `NotFound` when the entry is unknown or already stopped.
    async fn close(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError>;

    /// All of a user's entries, newest first
    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<TimeEntry>, BackendError>;
}

#[derive(Debug, Default)]
pub struct MemoryTimerStore {
    entries: RwLock<HashMap<Uuid, TimeEntry>>,
}

impl MemoryTimerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TimerStore for MemoryTimerStore {
    async fn running_for(&self, user_id: Uuid) -> Result<Option<TimeEntry>, BackendError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .find(|e| e.user_id == user_id && e.is_running())
            .cloned())
    }

    async fn insert_running(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError> {
        let mut entries = self.entries.write().await;
        if entries
            .values()
            .any(|e| e.user_id == entry.user_id && e.is_running())
        {
            return Err(BackendError::conflict("A timer is already running"));
        }
        entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn close(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&entry.id) {
            Some(stored) if stored.is_running() => {
                *stored = entry.clone();
                Ok(entry)
            }
            _ => Err(BackendError::not_found("No active timer")),
        }
    }

    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<TimeEntry>, BackendError> {
        let mut entries: Vec<TimeEntry> = self
            .entries
            .read()
            .await
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        Ok(entries)
    }
}
