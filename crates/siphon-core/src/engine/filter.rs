//! Filter Engine - 純粋なフィルタ述語
//!
//! `(records, window, allowlist) -> filtered records` の純関数のみ。
//! I/O もクロックも持たない。window の解決（既定 30 日窓など）は呼び出し側が
//! fetch 1 回につき 1 度だけ行う。

use crate::domain::{CategoryFilter, DateWindow, OrderDraft};

/// Per-record predicate:
/// `window.from <= order_date <= window.to` AND the category is allowed.
/// No other field is filterable in this design.
pub fn matches(draft: &OrderDraft, window: &DateWindow, filter: &CategoryFilter) -> bool {
    window.contains(draft.order_date) && filter.matches(&draft.product_category)
}

/// Keep the drafts satisfying both predicates, preserving input order.
pub fn apply(
    drafts: Vec<OrderDraft>,
    window: &DateWindow,
    filter: &CategoryFilter,
) -> Vec<OrderDraft> {
    drafts
        .into_iter()
        .filter(|d| matches(d, window, filter))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    fn window(from: &str, to: &str) -> DateWindow {
        DateWindow {
            from: from.parse::<DateTime<Utc>>().unwrap(),
            to: to.parse::<DateTime<Utc>>().unwrap(),
        }
    }

    fn draft(date: &str, category: &str) -> OrderDraft {
        OrderDraft {
            order_id: format!("ORD_{category}_{date}"),
            order_date: date.parse::<DateTime<Utc>>().unwrap(),
            product_name: "p".to_string(),
            product_category: category.to_string(),
            quantity: 1,
            unit_price: 10.0,
            total_amount: 10.0,
            customer_id: "c".to_string(),
            customer_country: "Japan".to_string(),
            source_specific: serde_json::Value::Null,
        }
    }

    #[test]
    fn date_bounds_are_inclusive_on_both_ends() {
        let w = window("2024-01-01T00:00:00Z", "2024-01-31T23:59:59Z");
        let drafts = vec![
            draft("2023-12-31T23:59:59Z", "Books"),
            draft("2024-01-01T00:00:00Z", "Books"), // exactly from
            draft("2024-01-15T12:00:00Z", "Books"),
            draft("2024-01-31T23:59:59Z", "Books"), // exactly to
            draft("2024-02-01T00:00:00Z", "Books"),
        ];

        let kept = apply(drafts, &w, &CategoryFilter::none());
        assert_eq!(kept.len(), 3);
        assert!(kept.iter().all(|d| w.contains(d.order_date)));
    }

    #[test]
    fn allowlist_restricts_categories() {
        let w = window("2024-01-01T00:00:00Z", "2024-12-31T00:00:00Z");
        let f = CategoryFilter::new(vec!["Electronics".to_string(), "Books".to_string()]);
        let drafts = vec![
            draft("2024-03-01T00:00:00Z", "Electronics"),
            draft("2024-03-01T00:00:00Z", "Clothing"),
            draft("2024-03-01T00:00:00Z", "Books"),
        ];

        let kept = apply(drafts, &w, &f);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| f.matches(&d.product_category)));
    }

    #[test]
    fn both_predicates_must_hold() {
        let w = window("2024-01-01T00:00:00Z", "2024-01-31T00:00:00Z");
        let f = CategoryFilter::new(vec!["Books".to_string()]);
        let drafts = vec![
            draft("2024-01-10T00:00:00Z", "Books"),    // both hold
            draft("2024-06-10T00:00:00Z", "Books"),    // category only
            draft("2024-01-10T00:00:00Z", "Clothing"), // window only
        ];

        let kept = apply(drafts, &w, &f);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].product_category, "Books");
    }

    #[test]
    fn filtering_is_idempotent() {
        let w = window("2024-01-01T00:00:00Z", "2024-06-30T00:00:00Z");
        let f = CategoryFilter::new(vec!["Electronics".to_string()]);
        let drafts = vec![
            draft("2024-02-01T00:00:00Z", "Electronics"),
            draft("2024-02-01T00:00:00Z", "Books"),
            draft("2025-02-01T00:00:00Z", "Electronics"),
        ];

        let once = apply(drafts, &w, &f);
        let twice = apply(once.clone(), &w, &f);
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_filter_equals_empty_allowlist() {
        let w = window("2024-01-01T00:00:00Z", "2024-12-31T00:00:00Z");
        let drafts = vec![
            draft("2024-03-01T00:00:00Z", "Electronics"),
            draft("2024-03-01T00:00:00Z", "Clothing"),
        ];

        let malformed = CategoryFilter::lenient_from_value(Some(&json!("{broken")));
        let empty = CategoryFilter::new(vec![]);

        assert_eq!(
            apply(drafts.clone(), &w, &malformed),
            apply(drafts, &w, &empty)
        );
    }
}
