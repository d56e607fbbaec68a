//! TaskQueue port - 作成から Worker への FIFO の受け渡し
//!
//! TaskQueue は task_id のみを流します（状態や payload は TaskStore に保存）。
//!
//! # 設計原則
//! - `push` は受理以上に呼び出し側をブロックしない
//! - `pop` は要素が来るまで suspend する
//! - Worker はプロセスで 1 本。これで「同一タスクの同時処理は起きない」が、
//!   同じ id の二重 enqueue 自体は防がない（再投入する側が status を確認する）

use async_trait::async_trait;

use crate::domain::{SiphonError, TaskId};

/// FIFO hand-off of task identifiers from creation to the worker.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task id. Fails with [`SiphonError::QueueClosed`] once the
    /// queue has been closed.
    async fn push(&self, task_id: TaskId) -> Result<(), SiphonError>;

    /// Wait for the next task id. Returns `None` when the queue is closed
    /// and drained; the worker loop uses this as its exit signal.
    async fn pop(&self) -> Option<TaskId>;

    /// 現在のキュー深さ（実装が対応していれば）。監視・テスト用。
    async fn depth(&self) -> Option<usize> {
        None
    }

    /// Close the queue: pending ids are still delivered, further pushes fail.
    fn close(&self);
}
