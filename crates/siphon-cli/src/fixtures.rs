//! Fixtures - デモ用サンプルデータ生成
//!
//! ソース A（JSON 配列）とソース B（CSV）の生バイト列を決定的に生成します。
//! シードを固定すれば毎回同じデータになるので、デモ出力が再現可能です。

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

const CATEGORIES: [&str; 5] = ["Electronics", "Clothing", "Books", "Home & Garden", "Sports"];

const PRODUCTS: [(&str, &str); 10] = [
    ("Electronics", "Wireless Headphones"),
    ("Electronics", "Smart Watch"),
    ("Clothing", "Running Shoes"),
    ("Clothing", "Jeans"),
    ("Books", "Programming Guide"),
    ("Books", "Mystery Novel"),
    ("Home & Garden", "Coffee Maker"),
    ("Home & Garden", "Garden Tools"),
    ("Sports", "Yoga Mat"),
    ("Sports", "Tennis Racket"),
];

const COUNTRIES: [&str; 8] = [
    "USA", "Germany", "Japan", "Brazil", "France", "UK", "Canada", "Australia",
];

/// Deterministic sample generator for both sources.
pub struct FixtureSet {
    rng: StdRng,
    now: DateTime<Utc>,
}

impl FixtureSet {
    pub fn new(seed: u64, now: DateTime<Utc>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            now,
        }
    }

    /// Order dates spread over the trailing 60 days, so roughly half fall
    /// inside the default 30-day window.
    fn order_date(&mut self) -> DateTime<Utc> {
        let minutes_back = self.rng.gen_range(0..60 * 24 * 60);
        self.now - Duration::minutes(minutes_back)
    }

    fn line_items(&mut self) -> (usize, i64, f64, f64, &'static str) {
        let product = self.rng.gen_range(0..PRODUCTS.len());
        let quantity = self.rng.gen_range(1..=5);
        let unit_price = f64::from(self.rng.gen_range(500..20000)) / 100.0;
        let total = (unit_price * quantity as f64 * 100.0).round() / 100.0;
        let country = COUNTRIES[self.rng.gen_range(0..COUNTRIES.len())];
        (product, quantity, unit_price, total, country)
    }

    /// Source A: JSON array, string-encoded numerics, nested payload encoded
    /// as a JSON string (the shape the hierarchical reader expects).
    pub fn source_a_json(&mut self, count: usize) -> Vec<u8> {
        let mut records = Vec::with_capacity(count);
        for n in 1..=count {
            let (product, quantity, unit_price, total, country) = self.line_items();
            let (category, name) = PRODUCTS[product];
            let payload = json!({
                "shop_name": format!("Shop_{}", self.rng.gen_range(1..=5)),
                "shop_rating": format!("{:.1}", self.rng.gen_range(30..=50) as f64 / 10.0),
            });
            records.push(json!({
                "order_id": format!("SOURCE_A_ORD_{n:04}"),
                "order_date": self.order_date().to_rfc3339(),
                "source": "source_a",
                "product_name": name,
                "product_category": category,
                "quantity": quantity.to_string(),
                "unit_price": format!("{unit_price:.2}"),
                "total_amount": format!("{total:.2}"),
                "customer_id": format!("CUST_{}", self.rng.gen_range(1000..10000)),
                "customer_country": country,
                "source_specific_data": payload.to_string(),
            }));
        }
        // Vec<Value> serialization cannot fail.
        serde_json::to_vec_pretty(&records).unwrap_or_default()
    }

    /// Source B: CSV with a header row; the nested payload cell is a
    /// JSON-encoded string, quoted and escaped the CSV way.
    pub fn source_b_csv(&mut self, count: usize) -> Vec<u8> {
        let mut out = String::from(
            "order_id,order_date,source,product_name,product_category,quantity,unit_price,total_amount,customer_id,customer_country,source_specific_data\n",
        );
        for n in 1..=count {
            let (product, quantity, unit_price, total, country) = self.line_items();
            let (category, name) = PRODUCTS[product];
            let payload = json!({
                "store_id": format!("STORE_{}", self.rng.gen_range(1..=8)),
                "shipping_method": if self.rng.gen_range(0..2) == 0 { "express" } else { "standard" },
            });
            let cell = payload.to_string().replace('"', "\"\"");
            out.push_str(&format!(
                "SOURCE_B_ORD_{n:04},{},source_b,{name},{category},{quantity},{unit_price:.2},{total:.2},CUST_{},{country},\"{cell}\"\n",
                self.order_date().to_rfc3339(),
                self.rng.gen_range(1000..10000),
            ));
        }
        out.into_bytes()
    }
}
