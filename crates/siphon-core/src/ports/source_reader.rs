//! SourceReader port - 上流データセットの取得と正規化
//!
//! # 契約
//! 1. raw データセットの全レコードを共通スキーマへパースする。date/number が
//!    coerce できないレコードが 1 件でもあれば、そのソースの fetch 全体を
//!    エラーで中断する（per-record skip はしない、all-or-nothing per source）
//! 2. フィルタリングは Filter Engine（engine::filter）へ委譲する。reader が
//!    述語ロジックを重複実装してはならない

use async_trait::async_trait;

use crate::domain::{CategoryFilter, DateWindow, OrderDraft, SiphonError, SourceTag};

/// Reads one raw data set and yields the normalized orders that satisfy the
/// task's date window and category allow-list.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Which source this reader serves; stamped onto every produced order.
    fn tag(&self) -> SourceTag;

    /// Parse everything, then filter. The window is resolved by the caller
    /// once per fetch; readers never consult the clock themselves.
    async fn fetch(
        &self,
        window: &DateWindow,
        filter: &CategoryFilter,
    ) -> Result<Vec<OrderDraft>, SiphonError>;
}
