/**
 * Database Operations for Time Tracking
 *
 * The `time_entries_one_running_per_user` partial unique index makes the
 * database reject a second open entry; that violation surfaces as
 * `Conflict`.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::timer::store::TimerStore;
use crate::shared::TimeEntry;

#[derive(sqlx::FromRow)]
struct TimeEntryRow {
    id: Uuid,
    user_id: Uuid,
    task_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    duration_seconds: Option<i64>,
}

impl From<TimeEntryRow> for TimeEntry {
    fn from(row: TimeEntryRow) -> Self {
        TimeEntry {
            id: row.id,
            user_id: row.user_id,
            task_id: row.task_id,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_seconds: row.duration_seconds,
        }
    }
}

#[derive(Clone)]
pub struct PgTimerStore {
    pool: PgPool,
}

impl PgTimerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TimerStore for PgTimerStore {
    async fn running_for(&self, user_id: Uuid) -> Result<Option<TimeEntry>, BackendError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(
            r#"
            SELECT id, user_id, task_id, start_time, end_time, duration_seconds
            FROM time_entries
            WHERE user_id = $1 AND end_time IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TimeEntry::from))
    }

    async fn insert_running(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError> {
        let result = sqlx::query(
            r#"
            INSERT INTO time_entries (id, user_id, task_id, start_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.task_id)
        .bind(entry.start_time)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(entry),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(BackendError::conflict("A timer is already running"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn close(&self, entry: TimeEntry) -> Result<TimeEntry, BackendError> {
        let row = sqlx::query_as::<_, TimeEntryRow>(
            r#"
            UPDATE time_entries
            SET end_time = $2, duration_seconds = $3
            WHERE id = $1 AND end_time IS NULL
            RETURNING id, user_id, task_id, start_time, end_time, duration_seconds
            "#,
        )
        .bind(entry.id)
        .bind(entry.end_time)
        .bind(entry.duration_seconds)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| BackendError::not_found("No active timer"))?;
        Ok(row.into())
    }

    async fn entries_for(&self, user_id: Uuid) -> Result<Vec<TimeEntry>, BackendError> {
        let rows = sqlx::query_as::<_, TimeEntryRow>(
            r#"
            SELECT id, user_id, task_id, start_time, end_time, duration_seconds
            FROM time_entries
            WHERE user_id = $1
            ORDER BY start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TimeEntry::from).collect())
    }
}
