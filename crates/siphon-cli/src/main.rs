//! siphon-cli - デモ用エントリポイント
//!
//! 固定シードのサンプルデータでランタイム一式を組み立て、タスクを 1 件流して
//! 取り込み結果を表示します。

mod config;
mod fixtures;

use std::sync::Arc;

use serde_json::json;
use tokio::time::{Duration, sleep};
use tracing::info;
use tracing_subscriber::EnvFilter;

use siphon_core::app::{TaskService, TaskWorker};
use siphon_core::domain::{NewTask, TaskStatus};
use siphon_core::engine::{CsvSourceReader, JsonSourceReader};
use siphon_core::impls::{InMemoryTaskStore, MpscTaskQueue};
use siphon_core::ports::{SystemClock, TaskStore, UlidGenerator};

use crate::config::Config;
use crate::fixtures::FixtureSet;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    info!(?config, "starting");

    // (A) 決定的なサンプルデータを両ソース分生成
    let clock = Arc::new(SystemClock);
    let mut fixtures = FixtureSet::new(config.fixture_seed, chrono::Utc::now());
    let source_a = JsonSourceReader::new(fixtures.source_a_json(config.fixture_orders))
        .with_latency(config.source_latency);
    let source_b = CsvSourceReader::new(fixtures.source_b_csv(config.fixture_orders))
        .with_latency(config.source_latency);

    // (B) store / queue / worker をワイヤリングして起動（worker は 1 本）
    let store: Arc<InMemoryTaskStore> = Arc::new(InMemoryTaskStore::new());
    let queue = Arc::new(MpscTaskQueue::new(config.queue_capacity));
    let ids = Arc::new(UlidGenerator::new(SystemClock));

    let worker = TaskWorker::new(
        store.clone(),
        queue.clone(),
        Arc::new(source_a),
        Arc::new(source_b),
        clock.clone(),
        ids.clone(),
    );
    let handle = worker.spawn();

    let service = TaskService::new(store.clone(), queue.clone(), clock, ids);

    // (C) タスク投入: デフォルトの 30 日窓、ソース A は Electronics のみ
    let mut input = NewTask::new("demo ingestion", "trailing 30 days, A restricted");
    input.source_a_filters = Some(json!({"categories": ["Electronics"]}));
    let task = match service.create_task(input).await {
        Ok(task) => task,
        Err(e) => {
            eprintln!("create_task failed: {e}");
            return;
        }
    };
    println!("created task: {}", task.id);

    // (D) 完了をポーリングで待つ（失敗なら Pending に戻って止まる）
    let mut polls = 0;
    loop {
        match service.get_task_status(task.id).await {
            Ok(current) if current.status == TaskStatus::Completed => {
                println!(
                    "task completed at {}",
                    current
                        .completed_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_default()
                );
                break;
            }
            Ok(current) => {
                polls += 1;
                if polls > 200 {
                    println!("task did not complete, final status: {:?}", current.status);
                    break;
                }
            }
            Err(e) => {
                eprintln!("status poll failed: {e}");
                break;
            }
        }
        sleep(Duration::from_millis(50)).await;
    }

    // (E) 取り込み結果のサマリを表示
    match store.list_orders(task.id).await {
        Ok(orders) => {
            println!("ingested {} orders", orders.len());
            for order in orders.iter().take(5) {
                println!(
                    "  {} {} {} x{} = {:.2} [{}]",
                    order.id,
                    order.order_date.date_naive(),
                    order.product_name,
                    order.quantity,
                    order.total_amount,
                    order.source,
                );
            }
            if orders.len() > 5 {
                println!("  ... and {} more", orders.len() - 5);
            }
        }
        Err(e) => eprintln!("order listing failed: {e}"),
    }

    match service.counts_by_status().await {
        Ok(counts) => println!("task counts: {counts:?}"),
        Err(e) => eprintln!("counts failed: {e}"),
    }

    // (F) graceful shutdown（処理中タスクは完走してから止まる）
    handle.shutdown_and_join().await;
}
