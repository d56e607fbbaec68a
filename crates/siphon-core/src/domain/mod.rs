//! Domain model (IDs, task lifecycle, orders, filters, errors).

pub mod errors;
pub mod filter;
pub mod ids;
pub mod order;
pub mod task;

// 主要な型を再エクスポート
pub use self::errors::SiphonError;
pub use self::filter::{CategoryFilter, DateWindow};
pub use self::ids::{OrderId, TaskId};
pub use self::order::{OrderDraft, OrderRecord, SourceTag};
pub use self::task::{NewTask, TaskRecord, TaskStatus};
