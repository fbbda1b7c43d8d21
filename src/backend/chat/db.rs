/**
 * Database Operations for Project Chat
 *
 * Persists project chat messages to PostgreSQL. Sender details are stored
 * alongside the message so history can be served without a users join.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::chat::store::MessageStore;
use crate::backend::error::BackendError;
use crate::shared::{ChatMessage, Identity, SendMessageRequest};

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    project_id: Uuid,
    content: String,
    message_type: String,
    sender_id: Uuid,
    sender_email: String,
    sender_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = BackendError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(ChatMessage {
            id: row.id,
            project_id: row.project_id,
            content: row.content,
            message_type: row.message_type.parse()?,
            sender: Identity {
                id: row.sender_id,
                email: row.sender_email,
                name: row.sender_name,
            },
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn persist_message(
        &self,
        request: &SendMessageRequest,
        sender: &Identity,
    ) -> Result<ChatMessage, BackendError> {
        let message = ChatMessage::from_request(request, sender.clone());

        sqlx::query(
            r#"
            INSERT INTO project_messages
                (id, project_id, content, message_type, sender_id, sender_email, sender_name, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id)
        .bind(message.project_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(sender.id)
        .bind(&sender.email)
        .bind(&sender.name)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    async fn recent_messages(
        &self,
        project_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, BackendError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT id, project_id, content, message_type, sender_id, sender_email, sender_name, created_at
            FROM project_messages
            WHERE project_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(project_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = rows
            .into_iter()
            .map(ChatMessage::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        messages.reverse();
        Ok(messages)
    }
}
