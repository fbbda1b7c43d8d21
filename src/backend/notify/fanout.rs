/**
 * Notification Fan-out
 *
 * Turns one domain event into:
 *
 * 1. a durable `NotificationRecord` for the target user
 * 2. a live `notification` push to the target's `user:<id>` room
 * 3. an email job keyed by the event's template
 * 4. one webhook call per matching active subscription
 *
 * Only step 1 can fail the call: the record is the source of truth and the
 * remaining sinks are best-effort. Each later step is isolated, so a failing
 * mailer never keeps a webhook from firing and vice versa.
 *
 * Access checks happen upstream; by the time an event reaches the fan-out the
 * actor was allowed to perform the action.
 *
 * The embedding service calls `notify` in-process after its own persistence
 * step; no HTTP route triggers it.
 */

use std::sync::Arc;

use crate::backend::error::BackendError;
use crate::backend::notify::email::{EmailJob, EmailQueue};
use crate::backend::notify::store::NotificationStore;
use crate::backend::notify::webhooks::{WebhookBody, WebhookDirectory, WebhookDispatcher};
use crate::backend::realtime::RoomManager;
use crate::shared::notification::NewNotification;
use crate::shared::{DomainEvent, NotificationRecord, ServerEvent};

/// What happened to each sink for one event
#[derive(Debug, Clone, PartialEq)]
pub struct FanoutReport {
    pub record: NotificationRecord,
    /// Live connections the push reached
    pub pushed: usize,
    pub email_queued: bool,
    /// Webhook deliveries started
    pub webhooks: usize,
}

#[derive(Clone)]
pub struct NotificationFanout {
    notifications: Arc<dyn NotificationStore>,
    rooms: RoomManager,
    email: Arc<dyn EmailQueue>,
    webhooks: Arc<dyn WebhookDirectory>,
    dispatcher: WebhookDispatcher,
}

impl NotificationFanout {
    pub fn new(
        notifications: Arc<dyn NotificationStore>,
        rooms: RoomManager,
        email: Arc<dyn EmailQueue>,
        webhooks: Arc<dyn WebhookDirectory>,
        dispatcher: WebhookDispatcher,
    ) -> Self {
        Self {
            notifications,
            rooms,
            email,
            webhooks,
            dispatcher,
        }
    }

    pub fn store(&self) -> &Arc<dyn NotificationStore> {
        &self.notifications
    }

    /// Fan one event out to every sink
    ///
    /// # Errors
    ///
    /// Only a failure to persist the record is returned. Live push, email
    /// and webhook failures are logged.
    pub async fn notify(&self, event: &DomainEvent) -> Result<NotificationRecord, BackendError> {
        Ok(self.notify_with_report(event).await?.record)
    }

    pub async fn notify_with_report(&self, event: &DomainEvent) -> Result<FanoutReport, BackendError> {
        let record = self
            .notifications
            .create(NewNotification::from(event))
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "[Fanout] Failed to store '{}' for user {}: {}",
                    event.canonical_name(),
                    event.target_user_id,
                    e
                )
            })?;

        let pushed = self.push_live(&record).await;
        let email_queued = self.queue_email(event, &record).await;
        let webhooks = self.fire_webhooks(event, &record).await;

        tracing::info!(
            "[Fanout] '{}' for user {}: pushed={} email={} webhooks={}",
            event.canonical_name(),
            event.target_user_id,
            pushed,
            email_queued,
            webhooks
        );
        Ok(FanoutReport {
            record,
            pushed,
            email_queued,
            webhooks,
        })
    }

    /// Fan out several events independently
    pub async fn notify_all(
        &self,
        events: &[DomainEvent],
    ) -> Vec<Result<NotificationRecord, BackendError>> {
        let mut results = Vec::with_capacity(events.len());
        for event in events {
            results.push(self.notify(event).await);
        }
        results
    }

    async fn push_live(&self, record: &NotificationRecord) -> usize {
        match serde_json::to_value(record) {
            Ok(payload) => {
                self.rooms
                    .broadcast_to_user(record.user_id, ServerEvent::Notification, payload)
                    .await
            }
            Err(e) => {
                tracing::error!("[Fanout] Failed to serialize notification {}: {}", record.id, e);
                0
            }
        }
    }

    async fn queue_email(&self, event: &DomainEvent, record: &NotificationRecord) -> bool {
        let job = EmailJob {
            template: event.kind.email_template(),
            recipient_id: event.target_user_id,
            data: serde_json::json!({
                "title": record.title,
                "message": record.message,
                "event": event.canonical_name(),
                "actorId": event.actor_id,
                "entity": event.entity,
            }),
        };
        match self.email.queue_email(job).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    "[Fanout] Email '{}' for user {} not queued: {}",
                    event.kind.email_template(),
                    event.target_user_id,
                    e
                );
                false
            }
        }
    }

    async fn fire_webhooks(&self, event: &DomainEvent, record: &NotificationRecord) -> usize {
        let name = event.canonical_name();
        let subscriptions = match self.webhooks.list_active(name).await {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                tracing::warn!("[Fanout] Webhook lookup for '{}' failed: {}", name, e);
                return 0;
            }
        };
        if subscriptions.is_empty() {
            return 0;
        }

        let body = WebhookBody::new(
            name,
            serde_json::json!({
                "actorId": event.actor_id,
                "targetUserId": event.target_user_id,
                "entity": event.entity,
                "notificationId": record.id,
            }),
        );
        self.dispatcher.dispatch(subscriptions, body)
    }
}
