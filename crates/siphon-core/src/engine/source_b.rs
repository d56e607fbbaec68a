//! Source B reader - 表形式（CSV）のデータセット
//!
//! 列はヘッダ駆動で解決する（列順に依存しない）。値はすべてテキストなので
//! source A と同じ coerce を通す。1 行でも失敗したら fetch 全体を中断する。

use async_trait::async_trait;
use csv_async::{AsyncReaderBuilder, StringRecord, Trim};
use futures::StreamExt;
use std::time::Duration;

use super::{coerce, filter};
use crate::domain::{CategoryFilter, DateWindow, OrderDraft, SiphonError, SourceTag};
use crate::ports::SourceReader;

/// Header positions resolved once per fetch.
struct Columns {
    order_id: usize,
    order_date: usize,
    product_name: usize,
    product_category: usize,
    quantity: usize,
    unit_price: usize,
    total_amount: usize,
    customer_id: usize,
    customer_country: usize,
    /// Optional: older exports do not carry the payload column.
    source_specific_data: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, String> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let required = |name: &'static str| {
            position(name).ok_or_else(|| format!("missing column `{name}`"))
        };
        Ok(Self {
            order_id: required("order_id")?,
            order_date: required("order_date")?,
            product_name: required("product_name")?,
            product_category: required("product_category")?,
            quantity: required("quantity")?,
            unit_price: required("unit_price")?,
            total_amount: required("total_amount")?,
            customer_id: required("customer_id")?,
            customer_country: required("customer_country")?,
            source_specific_data: position("source_specific_data"),
        })
    }
}

fn cell<'r>(record: &'r StringRecord, idx: usize, name: &'static str) -> Result<&'r str, String> {
    record.get(idx).ok_or_else(|| format!("row too short, no `{name}` cell"))
}

fn normalize(record: &StringRecord, cols: &Columns) -> Result<OrderDraft, String> {
    let date_text = cell(record, cols.order_date, "order_date")?;
    let quantity_text = cell(record, cols.quantity, "quantity")?;
    let unit_price_text = cell(record, cols.unit_price, "unit_price")?;
    let total_amount_text = cell(record, cols.total_amount, "total_amount")?;

    let source_specific = match cols.source_specific_data {
        Some(idx) => coerce::normalize_payload(serde_json::Value::String(
            cell(record, idx, "source_specific_data")?.to_string(),
        )),
        None => serde_json::Value::Null,
    };

    Ok(OrderDraft {
        order_date: coerce::parse_order_date("order_date", date_text)
            .map_err(|e| e.to_string())?,
        quantity: coerce::parse_i64_str("quantity", quantity_text).map_err(|e| e.to_string())?,
        unit_price: coerce::parse_f64_str("unit_price", unit_price_text)
            .map_err(|e| e.to_string())?,
        total_amount: coerce::parse_f64_str("total_amount", total_amount_text)
            .map_err(|e| e.to_string())?,
        order_id: cell(record, cols.order_id, "order_id")?.to_string(),
        product_name: cell(record, cols.product_name, "product_name")?.to_string(),
        product_category: cell(record, cols.product_category, "product_category")?.to_string(),
        customer_id: cell(record, cols.customer_id, "customer_id")?.to_string(),
        customer_country: cell(record, cols.customer_country, "customer_country")?.to_string(),
        source_specific,
    })
}

/// Reads source B from an in-memory CSV data set.
pub struct CsvSourceReader {
    raw: Vec<u8>,
    latency: Option<Duration>,
}

impl CsvSourceReader {
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

#[async_trait]
impl SourceReader for CsvSourceReader {
    fn tag(&self) -> SourceTag {
        SourceTag::SourceB
    }

    async fn fetch(
        &self,
        window: &DateWindow,
        filter: &CategoryFilter,
    ) -> Result<Vec<OrderDraft>, SiphonError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut reader = AsyncReaderBuilder::new()
            .trim(Trim::All)
            .create_reader(self.raw.as_slice());

        let headers = reader
            .headers()
            .await
            .map_err(|e| SiphonError::source_parse(self.tag(), format!("unreadable header: {e}")))?
            .clone();
        let cols = Columns::resolve(&headers)
            .map_err(|msg| SiphonError::source_parse(self.tag(), msg))?;

        let mut drafts = Vec::new();
        let mut records = reader.records();
        // Row numbering matches the file: header is row 1, data starts at 2.
        let mut row = 1usize;
        while let Some(record) = records.next().await {
            row += 1;
            let record = record
                .map_err(|e| SiphonError::source_parse(self.tag(), format!("row {row}: {e}")))?;
            let draft = normalize(&record, &cols)
                .map_err(|msg| SiphonError::source_parse(self.tag(), format!("row {row}: {msg}")))?;
            drafts.push(draft);
        }

        Ok(filter::apply(drafts, window, filter))
    }
}
