//! Source A reader - 階層構造（JSON）のデータセット
//!
//! raw データセットは JSON 配列。日付・数値はテキスト表現のことがあるので
//! coerce を通す。1 レコードでも coerce に失敗したら fetch 全体を中断する。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::{coerce, filter};
use crate::domain::{CategoryFilter, DateWindow, OrderDraft, SiphonError, SourceTag};
use crate::ports::SourceReader;

/// Raw record shape for source A. Unknown extra fields (e.g. the export's
/// own `source` column) are ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
    order_id: String,
    order_date: String,
    product_name: String,
    product_category: String,
    quantity: Value,
    unit_price: Value,
    total_amount: Value,
    customer_id: String,
    customer_country: String,
    #[serde(default)]
    source_specific_data: Value,
}

/// Reads source A from an in-memory JSON data set.
///
/// 上流 API の代わりに固定フォーマットのデータセットを読む（このコアは実
/// ネットワークを呼ばない）。`with_latency` で上流の遅延をシミュレートできる。
pub struct JsonSourceReader {
    raw: Vec<u8>,
    latency: Option<Duration>,
}

impl JsonSourceReader {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: raw.into(),
            latency: None,
        }
    }

    /// Simulate upstream connection delay on every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

fn normalize(raw: RawRecord) -> Result<OrderDraft, coerce::CoerceError> {
    Ok(OrderDraft {
        order_date: coerce::parse_order_date("order_date", &raw.order_date)?,
        quantity: coerce::parse_i64("quantity", &raw.quantity)?,
        unit_price: coerce::parse_f64("unit_price", &raw.unit_price)?,
        total_amount: coerce::parse_f64("total_amount", &raw.total_amount)?,
        order_id: raw.order_id,
        product_name: raw.product_name,
        product_category: raw.product_category,
        customer_id: raw.customer_id,
        customer_country: raw.customer_country,
        source_specific: coerce::normalize_payload(raw.source_specific_data),
    })
}

#[async_trait]
impl SourceReader for JsonSourceReader {
    fn tag(&self) -> SourceTag {
        SourceTag::SourceA
    }

    async fn fetch(
        &self,
        window: &DateWindow,
        filter: &CategoryFilter,
    ) -> Result<Vec<OrderDraft>, SiphonError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let raws: Vec<RawRecord> = serde_json::from_slice(&self.raw)
            .map_err(|e| SiphonError::source_parse(self.tag(), format!("invalid data set: {e}")))?;

        // Parse every record first; filtering never rescues a bad record.
        let mut drafts = Vec::with_capacity(raws.len());
        for (idx, raw) in raws.into_iter().enumerate() {
            let draft = normalize(raw)
                .map_err(|e| SiphonError::source_parse(self.tag(), format!("record {idx}: {e}")))?;
            drafts.push(draft);
        }

        Ok(filter::apply(drafts, window, filter))
    }
}
