/**
 * Notification Store
 *
 * Durable notification records. A record is created by the fan-out and
 * afterwards only its read flag changes; records are never deleted here.
 */

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::notification::NewNotification;
use crate::shared::NotificationRecord;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist a new unread record
    async fn create(&self, new: NewNotification) -> Result<NotificationRecord, BackendError>;

    /// A user's records, newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, BackendError>;

    /// Mark one of the user's records as read
    ///
    /// Fails with `NotFound` when the record does not exist or belongs to
    /// someone else.
    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, BackendError>;

    /// Mark all of the user's records as read; returns how many changed
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, BackendError>;
}

#[derive(Debug, Default)]
pub struct MemoryNotificationStore {
    records: RwLock<Vec<NotificationRecord>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, new: NewNotification) -> Result<NotificationRecord, BackendError> {
        let record = NotificationRecord::create(new);
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, BackendError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id && (!unread_only || !r.read))
            .cloned()
            .collect())
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, BackendError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| BackendError::not_found("Notification not found"))?;
        record.read = true;
        Ok(record.clone())
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, BackendError> {
        let mut records = self.records.write().await;
        let mut changed = 0;
        for record in records.iter_mut().filter(|r| r.user_id == user_id && !r.read) {
            record.read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
