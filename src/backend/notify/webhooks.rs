/**
 * Webhook Subscriptions and Dispatch
 *
 * External systems subscribe to canonical event names (`task.assigned`,
 * `issue.closed`, ...). Each matching active subscription receives one HTTP
 * POST per event:
 *
 * ```json
 * {"event": "task.assigned", "payload": {...}, "timestamp": "..."}
 * ```
 *
 * Delivery is best-effort: one attempt, no retry, no record of the outcome
 * beyond a log line. A subscription with a secret gets it back in the
 * `X-Webhook-Secret` header.
 */

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::backend::error::BackendError;

pub const SECRET_HEADER: &str = "X-Webhook-Secret";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSubscription {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub events: Vec<String>,
    pub active: bool,
    #[serde(default, skip_serializing)]
    pub secret: Option<String>,
}

impl WebhookSubscription {
    pub fn matches(&self, event_name: &str) -> bool {
        self.active && self.events.iter().any(|e| e == event_name)
    }
}

/// Body posted to a subscriber
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookBody {
    pub event: String,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl WebhookBody {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// `listActiveWebhooks` collaborator
#[async_trait]
pub trait WebhookDirectory: Send + Sync {
    /// Active subscriptions whose event set contains `event_name`
    async fn list_active(&self, event_name: &str) -> Result<Vec<WebhookSubscription>, BackendError>;
}

#[derive(Debug, Default)]
pub struct MemoryWebhookDirectory {
    subscriptions: RwLock<Vec<WebhookSubscription>>,
}

impl MemoryWebhookDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, subscription: WebhookSubscription) {
        self.subscriptions.write().await.push(subscription);
    }
}

#[async_trait]
impl WebhookDirectory for MemoryWebhookDirectory {
    async fn list_active(&self, event_name: &str) -> Result<Vec<WebhookSubscription>, BackendError> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .filter(|s| s.matches(event_name))
            .cloned()
            .collect())
    }
}

/// Outbound HTTP client for subscriber calls
#[derive(Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::delivery("webhook", e.to_string()))?;
        Ok(Self { client })
    }

    /// Make a single delivery attempt
    pub async fn deliver(
        &self,
        subscription: &WebhookSubscription,
        body: &WebhookBody,
    ) -> Result<(), BackendError> {
        let mut request = self.client.post(&subscription.url).json(body);
        if let Some(secret) = &subscription.secret {
            request = request.header(SECRET_HEADER, secret);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::delivery("webhook", e.to_string()))?;
        if !response.status().is_success() {
            return Err(BackendError::delivery(
                "webhook",
                format!("{} answered {}", subscription.url, response.status()),
            ));
        }
        Ok(())
    }

    /// Fire one independent delivery task per subscription
    ///
    /// Returns immediately with the number of deliveries started.
    pub fn dispatch(&self, subscriptions: Vec<WebhookSubscription>, body: WebhookBody) -> usize {
        let count = subscriptions.len();
        for subscription in subscriptions {
            let dispatcher = self.clone();
            let body = body.clone();
            tokio::spawn(async move {
                match dispatcher.deliver(&subscription, &body).await {
                    Ok(()) => tracing::debug!(
                        "[Webhook] '{}' delivered to {} ({})",
                        body.event,
                        subscription.name,
                        subscription.id
                    ),
                    Err(e) => tracing::warn!(
                        "[Webhook] '{}' to {} ({}) failed: {}",
                        body.event,
                        subscription.name,
                        subscription.id,
                        e
                    ),
                }
            });
        }
        count
    }
}
