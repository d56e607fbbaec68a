//! MpscTaskQueue - tokio mpsc channel ベースの FIFO キュー
//!
//! # 実装詳細
//! - bounded channel。`push` は空きが出るまで待つが、受理以外の仕事はしない
//! - receiver は Mutex 越しに共有（Worker はプロセスに 1 本なので競合しない）
//! - `close` は sender を破棄する。buffer に残った id は引き続き配送され、
//!   以後の `push` は QueueClosed になる
//!
//! # 信頼性
//! - At-most-once: プロセスが落ちれば queue 内の id は失われる（タスク自体は
//!   TaskStore に Pending のまま残るので、再投入で回復できる）

use async_trait::async_trait;
use std::sync::Mutex as StdMutex;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{SiphonError, TaskId};
use crate::ports::TaskQueue;

pub struct MpscTaskQueue {
    /// Dropped on close; push fails from then on.
    sender: StdMutex<Option<mpsc::Sender<TaskId>>>,
    receiver: Mutex<mpsc::Receiver<TaskId>>,
    capacity: usize,
}

impl MpscTaskQueue {
    /// Create a queue buffering up to `capacity` task ids.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            sender: StdMutex::new(Some(tx)),
            receiver: Mutex::new(rx),
            capacity,
        }
    }
}

#[async_trait]
impl TaskQueue for MpscTaskQueue {
    async fn push(&self, task_id: TaskId) -> Result<(), SiphonError> {
        let sender = {
            let guard = self.sender.lock().expect("sender lock poisoned");
            guard.clone()
        };
        let Some(sender) = sender else {
            return Err(SiphonError::QueueClosed);
        };
        sender
            .send(task_id)
            .await
            .map_err(|_| SiphonError::QueueClosed)
    }

    async fn pop(&self) -> Option<TaskId> {
        self.receiver.lock().await.recv().await
    }

    async fn depth(&self) -> Option<usize> {
        let guard = self.sender.lock().expect("sender lock poisoned");
        guard
            .as_ref()
            .map(|tx| self.capacity - tx.capacity())
    }

    fn close(&self) {
        let mut guard = self.sender.lock().expect("sender lock poisoned");
        guard.take();
    }
}
