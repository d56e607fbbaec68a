//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTaskStore**: タスクとオーダーの正本（リファレンス実装）
//! - **MpscTaskQueue**: tokio mpsc ベースの FIFO キュー
//!
//! # 本番用実装
//! 実際のデータベースを使う TaskStore は別クレートに配置する想定
//! （trait が seam）。

pub mod memory_store;
pub mod mpsc_queue;

pub use self::memory_store::InMemoryTaskStore;
pub use self::mpsc_queue::MpscTaskQueue;
