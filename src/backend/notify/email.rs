/**
 * Email Queue
 *
 * `queueEmail(template, data)` collaborator. Queuing never blocks the
 * caller: jobs go into a bounded channel drained by a background worker
 * that resolves the recipient's address and sends through SMTP. A full
 * queue rejects the job, and the fan-out logs and moves on.
 *
 * Without SMTP settings the server uses `LogOnlyEmailQueue`.
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::server::config::SmtpSettings;
use crate::shared::notification::EmailTemplate;

/// One email to render and send
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailJob {
    pub template: EmailTemplate,
    pub recipient_id: Uuid,
    pub data: serde_json::Value,
}

impl EmailJob {
    pub fn subject(&self) -> String {
        self.data
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.template.to_string())
    }

    pub fn body(&self) -> String {
        self.data
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
pub trait EmailQueue: Send + Sync {
    async fn queue_email(&self, job: EmailJob) -> Result<(), BackendError>;
}

/// Resolves a user id to an email address
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    async fn email_for(&self, user_id: Uuid) -> Result<Option<String>, BackendError>;
}

#[derive(Debug, Default)]
pub struct MemoryRecipients {
    addresses: RwLock<HashMap<Uuid, String>>,
}

impl MemoryRecipients {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user_id: Uuid, email: impl Into<String>) {
        self.addresses.write().await.insert(user_id, email.into());
    }
}

#[async_trait]
impl RecipientDirectory for MemoryRecipients {
    async fn email_for(&self, user_id: Uuid) -> Result<Option<String>, BackendError> {
        Ok(self.addresses.read().await.get(&user_id).cloned())
    }
}

/// Queue that only logs; used when SMTP is not configured
#[derive(Debug, Default, Clone)]
pub struct LogOnlyEmailQueue;

#[async_trait]
impl EmailQueue for LogOnlyEmailQueue {
    async fn queue_email(&self, job: EmailJob) -> Result<(), BackendError> {
        tracing::info!(
            "[Email] (log only) '{}' for user {}: {}",
            job.template,
            job.recipient_id,
            job.subject()
        );
        Ok(())
    }
}

/// Bounded queue drained by an SMTP worker task
#[derive(Clone)]
pub struct SmtpEmailQueue {
    sender: mpsc::Sender<EmailJob>,
}

impl SmtpEmailQueue {
    /// Build the transport and start the worker
    pub fn spawn(
        settings: &SmtpSettings,
        recipients: Arc<dyn RecipientDirectory>,
        capacity: usize,
    ) -> Result<Self, BackendError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|e| BackendError::delivery("email", e.to_string()))?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();
        let from = settings.from.clone();
        let (sender, mut receiver) = mpsc::channel::<EmailJob>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                if let Err(e) = send_job(&transport, &from, recipients.as_ref(), &job).await {
                    tracing::warn!(
                        "[Email] '{}' for user {} not sent: {}",
                        job.template,
                        job.recipient_id,
                        e
                    );
                }
            }
            tracing::info!("[Email] Queue closed, worker stopping");
        });

        tracing::info!("[Email] SMTP queue started via {}", settings.host);
        Ok(Self { sender })
    }
}

#[async_trait]
impl EmailQueue for SmtpEmailQueue {
    async fn queue_email(&self, job: EmailJob) -> Result<(), BackendError> {
        self.sender
            .try_send(job)
            .map_err(|e| BackendError::delivery("email", e.to_string()))
    }
}

async fn send_job(
    transport: &AsyncSmtpTransport<Tokio1Executor>,
    from: &str,
    recipients: &dyn RecipientDirectory,
    job: &EmailJob,
) -> Result<(), BackendError> {
    let Some(to) = recipients.email_for(job.recipient_id).await? else {
        tracing::debug!("[Email] No address for user {}", job.recipient_id);
        return Ok(());
    };

    let message = Message::builder()
        .from(from.parse::<Mailbox>().map_err(|e| address_error(from, e))?)
        .to(to.parse::<Mailbox>().map_err(|e| address_error(&to, e))?)
        .subject(job.subject())
        .header(ContentType::TEXT_PLAIN)
        .body(job.body())
        .map_err(|e| BackendError::delivery("email", e.to_string()))?;

    transport
        .send(message)
        .await
        .map_err(|e| BackendError::delivery("email", e.to_string()))?;
    tracing::debug!("[Email] '{}' sent to user {}", job.template, job.recipient_id);
    Ok(())
}

fn address_error(address: &str, e: lettre::address::AddressError) -> BackendError {
    BackendError::delivery("email", format!("invalid address '{}': {}", address, e))
}
