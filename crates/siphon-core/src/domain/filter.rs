//! Filter parameters: date window + category allow-list.
//!
//! # 設計原則
//! - DateWindow は fetch 1 回につき 1 度だけ解決する（レコード毎に now を
//!   取り直すと長時間スキャン中にズレるため）
//! - 壊れた filter payload はエラーにせず「フィルタなし」に落とす

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// Inclusive date range for order filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateWindow {
    /// Default lookback when a task has no explicit bounds.
    pub const DEFAULT_LOOKBACK_DAYS: i64 = 30;

    /// Resolve a task's optional bounds against a fixed `now`.
    ///
    /// `now` is sampled once per fetch call and threaded in, so every record
    /// in one scan is judged against the same window.
    pub fn resolve(
        date_from: Option<DateTime<Utc>>,
        date_to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            from: date_from.unwrap_or(now - Duration::days(Self::DEFAULT_LOOKBACK_DAYS)),
            to: date_to.unwrap_or(now),
        }
    }

    /// Inclusive on both ends: `from <= at <= to`.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Category allow-list. Empty means "match all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryFilter {
    categories: Vec<String>,
}

impl CategoryFilter {
    /// No restriction: every category matches.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    /// Parse a raw filter payload, degrading to "no filter" on anything
    /// malformed rather than failing the task.
    ///
    /// Accepted shapes:
    /// - `{"categories": ["Electronics", ...]}`
    /// - the same object JSON-encoded inside a string (sources hand filters
    ///   around as text)
    /// - non-string entries inside the array are skipped
    ///
    /// Everything else (wrong type, unparsable string, missing key) is
    /// treated as an empty allow-list.
    pub fn lenient_from_value(raw: Option<&Value>) -> Self {
        let Some(raw) = raw else {
            return Self::none();
        };

        let parsed_from_text;
        let payload = match raw {
            Value::Object(_) => raw,
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(v) if v.is_object() => {
                    parsed_from_text = v;
                    &parsed_from_text
                }
                _ => return Self::none(),
            },
            _ => return Self::none(),
        };

        let Some(Value::Array(entries)) = payload.get("categories") else {
            return Self::none();
        };

        Self::new(
            entries
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    pub fn is_unrestricted(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Empty allow-list matches everything; otherwise exact membership.
    pub fn matches(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }
}
