//! Config - 環境変数によるデモ設定
//!
//! 未設定・解釈不能な値はデフォルトにフォールバックします（起動は止めない）。

use std::time::Duration;

/// Runtime knobs, all overridable via `SIPHON_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Queue capacity before `create_task` backpressures.
    pub queue_capacity: usize,

    /// Records generated per source.
    pub fixture_orders: usize,

    /// Seed for the fixture generator.
    pub fixture_seed: u64,

    /// Simulated per-fetch latency, zero to disable.
    pub source_latency: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            fixture_orders: 50,
            fixture_seed: 42,
            source_latency: Duration::from_millis(100),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            queue_capacity: env_parse("SIPHON_QUEUE_CAPACITY", defaults.queue_capacity),
            fixture_orders: env_parse("SIPHON_FIXTURE_ORDERS", defaults.fixture_orders),
            fixture_seed: env_parse("SIPHON_FIXTURE_SEED", defaults.fixture_seed),
            source_latency: Duration::from_millis(env_parse(
                "SIPHON_SOURCE_LATENCY_MS",
                defaults.source_latency.as_millis() as u64,
            )),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
