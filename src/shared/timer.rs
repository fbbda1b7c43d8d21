//! Time tracking entries.
//!
//! A user has at most one running entry (no `end_time`) at any instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds, set when the timer stops
    #[serde(default)]
    pub duration_seconds: Option<i64>,
}

impl TimeEntry {
    /// A new running entry
    pub fn start(user_id: Uuid, task_id: Uuid, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            task_id,
            start_time,
            end_time: None,
            duration_seconds: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the entry at `end_time`, flooring the duration to whole seconds
    pub fn stop_at(mut self, end_time: DateTime<Utc>) -> Self {
        let elapsed = (end_time - self.start_time).num_milliseconds().max(0);
        self.end_time = Some(end_time);
        self.duration_seconds = Some(elapsed.div_euclid(1000));
        self
    }
}

/// Request body for `POST /api/timers/start`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartTimerRequest {
    pub task_id: Uuid,
}
