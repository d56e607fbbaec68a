//! TaskService - タスクの受付・照会ファサード
//!
//! # 責務
//! - 作成: id 採番 → Pending で persist → queue へ投入
//! - 照会: 状態取得・一覧・取り込み結果の読み出し
//!
//! # 設計原則
//! - worker と同じ store/queue を共有するだけで、worker 本体には触れない
//! - 存在しない id は常に `TaskNotFound`（空の結果集合とは区別する）

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::{NewTask, OrderRecord, SiphonError, TaskId, TaskRecord, TaskStatus};
use crate::ports::{Clock, IdGenerator, TaskQueue, TaskStore};

/// Per-status task counts, for operational snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Submission and query façade over the store and the queue.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    queue: Arc<dyn TaskQueue>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl TaskService {
    pub fn new(
        store: Arc<dyn TaskStore>,
        queue: Arc<dyn TaskQueue>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            queue,
            clock,
            ids,
        }
    }

    /// Create a task and enqueue it for processing.
    ///
    /// The record is always created Pending, whatever the caller intended;
    /// only the worker moves a task out of Pending. Persist happens before
    /// enqueue, so a popped id always resolves (barring external deletes).
    pub async fn create_task(&self, input: NewTask) -> Result<TaskRecord, SiphonError> {
        let task = TaskRecord::create(self.ids.task_id(), input, self.clock.now());
        self.store.insert_task(task.clone()).await?;
        self.queue.push(task.id).await?;
        info!(task_id = %task.id, title = %task.title, "task created and enqueued");
        Ok(task)
    }

    /// Current record for one task, lifecycle fields included.
    pub async fn get_task_status(&self, id: TaskId) -> Result<TaskRecord, SiphonError> {
        self.store
            .get_task(id)
            .await?
            .ok_or(SiphonError::TaskNotFound(id))
    }

    /// All known tasks, whatever their status.
    pub async fn get_all_tasks(&self) -> Result<Vec<TaskRecord>, SiphonError> {
        self.store.list_tasks().await
    }

    /// Orders ingested by one task.
    ///
    /// Unknown id is an error; a known task that has produced nothing (not
    /// yet run, failed, or nothing matched) is an empty Vec.
    pub async fn get_task_data(&self, id: TaskId) -> Result<Vec<OrderRecord>, SiphonError> {
        if self.store.get_task(id).await?.is_none() {
            return Err(SiphonError::TaskNotFound(id));
        }
        self.store.list_orders(id).await
    }

    /// Orders across all tasks, in insertion order.
    pub async fn get_all_orders(&self) -> Result<Vec<OrderRecord>, SiphonError> {
        self.store.list_all_orders().await
    }

    /// Re-enqueue a reverted task.
    ///
    /// Pushing overlaps an id already in the queue, so only Pending tasks are
    /// pushed; anything else returns `false` untouched. Callers checking and
    /// pushing concurrently can still double-enqueue; the worker tolerates
    /// that by re-reading status on pop.
    pub async fn requeue_task(&self, id: TaskId) -> Result<bool, SiphonError> {
        let task = self.get_task_status(id).await?;
        if task.status != TaskStatus::Pending {
            return Ok(false);
        }
        self.queue.push(id).await?;
        info!(task_id = %id, "task re-enqueued");
        Ok(true)
    }

    /// Snapshot of task counts per status.
    pub async fn counts_by_status(&self) -> Result<TaskCounts, SiphonError> {
        let mut counts = TaskCounts::default();
        for task in self.store.list_tasks().await? {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Completed => counts.completed += 1,
            }
        }
        Ok(counts)
    }
}
