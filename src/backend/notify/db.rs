/**
 * Database Operations for Notifications
 *
 * PostgreSQL implementations of the notification store, the webhook
 * directory and recipient address lookup.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::notify::email::RecipientDirectory;
use crate::backend::notify::store::NotificationStore;
use crate::backend::notify::webhooks::{WebhookDirectory, WebhookSubscription};
use crate::shared::notification::NewNotification;
use crate::shared::{EntityKind, EntitySummary, NotificationRecord};

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    message: String,
    #[sqlx(rename = "type")]
    kind: String,
    read: bool,
    entity_kind: Option<String>,
    entity_id: Option<Uuid>,
    entity_title: Option<String>,
    project_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

fn parse_entity_kind(value: &str) -> Option<EntityKind> {
    match value {
        "project" => Some(EntityKind::Project),
        "task" => Some(EntityKind::Task),
        "issue" => Some(EntityKind::Issue),
        "calendar_event" => Some(EntityKind::CalendarEvent),
        _ => None,
    }
}

impl TryFrom<NotificationRow> for NotificationRecord {
    type Error = BackendError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let entity = match (row.entity_kind.as_deref().and_then(parse_entity_kind), row.entity_id) {
            (Some(kind), Some(id)) => Some(EntitySummary {
                kind,
                id,
                title: row.entity_title.unwrap_or_default(),
                project_id: row.project_id,
            }),
            _ => None,
        };
        Ok(NotificationRecord {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            message: row.message,
            kind: row.kind.parse()?,
            read: row.read,
            entity,
            created_at: row.created_at,
        })
    }
}

const SELECT_NOTIFICATION: &str = r#"
    SELECT id, user_id, title, message, type, read,
           entity_kind, entity_id, entity_title, project_id, created_at
    FROM notifications
"#;

#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn create(&self, new: NewNotification) -> Result<NotificationRecord, BackendError> {
        let record = NotificationRecord::create(new);
        let entity = record.entity.as_ref();

        sqlx::query(
            r#"
            INSERT INTO notifications
                (id, user_id, title, message, type, read,
                 entity_kind, entity_id, entity_title, project_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(&record.title)
        .bind(&record.message)
        .bind(record.kind.as_str())
        .bind(record.read)
        .bind(entity.map(|e| e.kind.as_str()))
        .bind(entity.map(|e| e.id))
        .bind(entity.map(|e| e.title.clone()))
        .bind(entity.and_then(|e| e.project_id))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<NotificationRecord>, BackendError> {
        let query = format!(
            "{} WHERE user_id = $1 AND (NOT $2 OR read = FALSE) ORDER BY created_at DESC",
            SELECT_NOTIFICATION
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&query)
            .bind(user_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(NotificationRecord::try_from).collect()
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<NotificationRecord, BackendError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r#"
            UPDATE notifications SET read = TRUE
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, message, type, read,
                      entity_kind, entity_id, entity_title, project_id, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BackendError::not_found("Notification not found"))?;
        row.try_into()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, BackendError> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[derive(Clone)]
pub struct PgWebhookDirectory {
    pool: PgPool,
}

impl PgWebhookDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookDirectory for PgWebhookDirectory {
    async fn list_active(&self, event_name: &str) -> Result<Vec<WebhookSubscription>, BackendError> {
        let subscriptions = sqlx::query_as::<_, WebhookSubscription>(
            r#"
            SELECT id, name, url, events, active, secret
            FROM webhook_subscriptions
            WHERE active AND $1 = ANY(events)
            "#,
        )
        .bind(event_name)
        .fetch_all(&self.pool)
        .await?;
        Ok(subscriptions)
    }
}

#[derive(Clone)]
pub struct PgRecipients {
    pool: PgPool,
}

impl PgRecipients {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PgRecipients {
    async fn email_for(&self, user_id: Uuid) -> Result<Option<String>, BackendError> {
        let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(email)
    }
}
