//! Errors - エラー型と分類
//!
//! # 分類
//! - `TaskNotFound`: 照会系で ID が存在しない（致命的ではない、呼び出し側へ返す）
//! - `SourceParse`: ソースのレコードが coerce できない（そのソースの fetch を
//!   丸ごと中断し、タスク全体の処理失敗として扱う）
//! - `Store`: 永続化の書き込み失敗（その試行は失敗、タスクは Pending に戻る）
//! - `QueueClosed`: キューが閉じている（enqueue 不可）
//!
//! 壊れた filter payload はここに現れない: ローカルに「フィルタなし」へ
//! 回復され、エラーとして伝播しない。

use thiserror::Error;

use super::ids::TaskId;
use super::order::SourceTag;

#[derive(Debug, Error)]
pub enum SiphonError {
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("{tag} fetch aborted: {message}")]
    SourceParse { tag: SourceTag, message: String },

    #[error("store operation failed: {0}")]
    Store(String),

    #[error("task queue is closed")]
    QueueClosed,
}

impl SiphonError {
    /// Helper for readers: wrap a field-level coercion failure.
    pub fn source_parse(tag: SourceTag, message: impl Into<String>) -> Self {
        Self::SourceParse {
            tag,
            message: message.into(),
        }
    }
}
