//! Task record: lifecycle state machine + ingestion parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// Task lifecycle status.
///
/// State transitions:
/// - Pending -> InProgress -> Completed (success)
/// - Pending -> InProgress -> Pending (revert on failure, retry-eligible)
///
/// Design note: a task sitting in Pending after having been observed
/// InProgress means "failed, awaiting external re-enqueue"; the status alone
/// does not distinguish it from "never started".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be processed (initial state, or reverted after a failure).
    Pending,

    /// Currently being processed by the worker.
    InProgress,

    /// All enabled sources ingested successfully.
    Completed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

/// Creation input for a task.
///
/// Both sources default to enabled; filters and date bounds are optional.
/// The filter payloads stay as raw JSON here; they are interpreted
/// leniently at processing time (see [`crate::domain::CategoryFilter`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,

    /// Inclusive lower date bound. Unset: trailing 30-day window at fetch time.
    #[serde(default)]
    pub date_from: Option<DateTime<Utc>>,

    /// Inclusive upper date bound. Unset: "now" at fetch time.
    #[serde(default)]
    pub date_to: Option<DateTime<Utc>>,

    #[serde(default = "default_enabled")]
    pub source_a_enabled: bool,

    #[serde(default = "default_enabled")]
    pub source_b_enabled: bool,

    /// Raw filter payload for source A, e.g. `{"categories": ["Electronics"]}`.
    #[serde(default)]
    pub source_a_filters: Option<serde_json::Value>,

    /// Raw filter payload for source B, same shape as source A's.
    #[serde(default)]
    pub source_b_filters: Option<serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl NewTask {
    /// Minimal input: both sources on, no bounds, no filters.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            date_from: None,
            date_to: None,
            source_a_enabled: true,
            source_b_enabled: true,
            source_a_filters: None,
            source_b_filters: None,
        }
    }
}

/// タスクの正本レコード。
///
/// # 設計原則
/// - 状態遷移はメソッド経由（フィールド直接変更はしない）
/// - `created_at` は作成時に固定、以後不変
/// - 不変条件: `completed_at` は `status == Completed` のときに限り Some
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,

    /// Set exactly once, on successful completion.
    pub completed_at: Option<DateTime<Utc>>,

    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,

    pub source_a_enabled: bool,
    pub source_b_enabled: bool,

    pub source_a_filters: Option<serde_json::Value>,
    pub source_b_filters: Option<serde_json::Value>,
}

impl TaskRecord {
    /// Create a new record in Pending from the creation input.
    pub fn create(id: TaskId, input: NewTask, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            date_from: input.date_from,
            date_to: input.date_to,
            source_a_enabled: input.source_a_enabled,
            source_b_enabled: input.source_b_enabled,
            source_a_filters: input.source_a_filters,
            source_b_filters: input.source_b_filters,
        }
    }

    /// Mark as in progress (worker has dequeued this task).
    pub fn begin(&mut self) {
        self.status = TaskStatus::InProgress;
    }

    /// Mark as completed; records the completion time.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    /// Revert to Pending after a processing failure.
    ///
    /// The task becomes eligible for re-processing only if some external
    /// actor re-enqueues it; nothing here schedules a retry.
    pub fn revert(&mut self) {
        self.status = TaskStatus::Pending;
        self.completed_at = None;
    }

    /// 不変条件チェック: completed_at は Completed のときに限り Some
    pub fn invariant_holds(&self) -> bool {
        (self.status == TaskStatus::Completed) == self.completed_at.is_some()
    }
}
