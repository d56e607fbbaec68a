//! Order model: normalized purchase records owned by a task.
//!
//! This module is source-agnostic: it only defines the common schema both
//! readers normalize into, plus the tag identifying where a record came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{OrderId, TaskId};

/// Which upstream data set an order came from.
///
/// Serialized in snake_case to match the raw data sets' `source` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    SourceA,
    SourceB,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::SourceA => "source_a",
            SourceTag::SourceB => "source_b",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, normalized order before it is attributed to a task.
///
/// Readers produce drafts; the worker stamps them with the owning task id,
/// the source tag and a store id to form an [`OrderRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Original order ID from the source (not our identifier).
    pub order_id: String,
    pub order_date: DateTime<Utc>,
    pub product_name: String,
    pub product_category: String,
    pub quantity: i64,
    pub unit_price: f64,

    /// Supplied by the source independently; never recomputed from
    /// `quantity * unit_price`.
    pub total_amount: f64,

    pub customer_id: String,
    pub customer_country: String,

    /// Free-form source-specific attributes outside the common schema.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub source_specific: serde_json::Value,
}

/// 永続化されるオーダーの正本レコード。
///
/// # 所有関係
/// - ちょうど 1 つの Task に属する（共有・再割当なし）
/// - Worker が処理中に一括生成し、以後 immutable（更新・削除なし）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub task_id: TaskId,
    pub source: SourceTag,

    pub order_id: String,
    pub order_date: DateTime<Utc>,
    pub product_name: String,
    pub product_category: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_amount: f64,
    pub customer_id: String,
    pub customer_country: String,

    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub source_specific: serde_json::Value,
}

impl OrderRecord {
    /// Attribute a draft to its owning task.
    pub fn from_draft(id: OrderId, task_id: TaskId, source: SourceTag, draft: OrderDraft) -> Self {
        Self {
            id,
            task_id,
            source,
            order_id: draft.order_id,
            order_date: draft.order_date,
            product_name: draft.product_name,
            product_category: draft.product_category,
            quantity: draft.quantity,
            unit_price: draft.unit_price,
            total_amount: draft.total_amount,
            customer_id: draft.customer_id,
            customer_country: draft.customer_country,
            source_specific: draft.source_specific,
        }
    }
}
