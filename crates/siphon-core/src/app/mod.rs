//! App - アプリケーション層
//!
//! ports を組み合わせてタスク取り込みのアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **TaskService**: 作成・照会ファサード（create→persist→enqueue）
//! - **TaskWorker**: シングルトン実行ループ（pop→begin→ingest→complete/revert）

pub mod service;
pub mod worker;

// 主要な型を再エクスポート
pub use self::service::{TaskCounts, TaskService};
pub use self::worker::{TaskWorker, WorkerHandle};
