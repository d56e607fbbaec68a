//! TaskStore port - タスクとオーダーの正本（source of truth）
//!
//! TaskStore は以下を管理します：
//! - タスクのメタデータと状態（TaskRecord）
//! - タスクが所有するオーダー（OrderRecord、タスク単位で一括挿入）
//!
//! # 設計原則
//! - 単一 writer（Worker）+ 複数 reader（照会系）を前提
//! - 各メソッド呼び出しは原子的に観測される（遷移前か遷移後、破れた状態は
//!   見えない）
//! - 要求されるルックアップは point lookup と full scan のみ
//!   （task id、および task id によるオーダー検索）

use async_trait::async_trait;

use crate::domain::{OrderRecord, SiphonError, TaskId, TaskRecord};

/// Durable persistence abstraction for tasks and their owned orders.
///
/// The in-memory implementation ([`crate::impls::InMemoryTaskStore`]) is the
/// reference; this trait is the seam for a real database.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task. The id is already assigned by the caller.
    async fn insert_task(&self, task: TaskRecord) -> Result<(), SiphonError>;

    /// Point lookup. `Ok(None)` means "no such task" (not an error here,
    /// callers decide whether absence is a NotFound condition).
    async fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, SiphonError>;

    /// Full scan. Iteration order is not guaranteed.
    async fn list_tasks(&self) -> Result<Vec<TaskRecord>, SiphonError>;

    /// Full replace of the task's mutable fields. Fails on an unknown id
    /// (an upsert here would mask dropped-id bugs).
    async fn update_task(&self, task: TaskRecord) -> Result<(), SiphonError>;

    /// Batch insert of one source's orders. Orders are immutable once
    /// written; there is no update or delete.
    async fn insert_orders(&self, orders: Vec<OrderRecord>) -> Result<(), SiphonError>;

    /// All orders owned by a task. An empty list is a valid outcome,
    /// distinct from the task not existing.
    async fn list_orders(&self, task_id: TaskId) -> Result<Vec<OrderRecord>, SiphonError>;

    /// All orders across every task.
    async fn list_all_orders(&self) -> Result<Vec<OrderRecord>, SiphonError>;
}
