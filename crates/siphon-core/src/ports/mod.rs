//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部世界（永続ストア、キュー、上流データソース、時計）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - TaskStore が source of truth（正本）
//! - TaskQueue は task_id のみを流す（payload は持たない）
//! - SourceReader は正規化まで、フィルタ述語は engine::filter に委譲

pub mod clock;
pub mod id_generator;
pub mod source_reader;
pub mod task_queue;
pub mod task_store;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::source_reader::SourceReader;
pub use self::task_queue::TaskQueue;
pub use self::task_store::TaskStore;
