//! TaskWorker - タスク実行ループ（シングルトン）
//!
//! # フロー
//! 1. TaskQueue::pop() で task_id 取得
//! 2. TaskStore から load（存在しなければ log して drop）
//! 3. InProgress へ遷移して即 persist
//! 4. 有効なソースごとに fetch + filter → OrderRecord を一括 insert（A → B の固定順）
//! 5. 全ソース成功: Completed + completed_at を persist
//!    いずれか失敗: Pending へ戻して persist（自動再投入はしない）
//!
//! # 設計原則
//! - Worker はプロセスに 1 本。タスクは厳密に逐次処理（store への cross-task
//!   race を排除する simplicity/correctness トレードオフ）
//! - ソース単位のエラーは per-task handler で吸収し、ループ自体は決して
//!   落とさない
//! - 失敗したソースより前に成功したソースの orders はロールバックしない
//!   （観測可能な挙動として維持、テストで固定）

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::domain::{
    CategoryFilter, DateWindow, OrderRecord, SiphonError, TaskId, TaskRecord, TaskStatus,
};
use crate::ports::{Clock, IdGenerator, SourceReader, TaskQueue, TaskStore};

/// Singleton background worker driving tasks through their state machine.
///
/// Explicitly constructed and dependency-injected; the composition root owns
/// it, starts it once, and hands it the queue. No ambient global state.
pub struct TaskWorker {
    store: Arc<dyn TaskStore>,
    queue: Arc<dyn TaskQueue>,
    source_a: Arc<dyn SourceReader>,
    source_b: Arc<dyn SourceReader>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

/// Handle to a spawned worker.
/// - `request_shutdown()` で新規 lease の取得を止める
/// - `shutdown_and_join()` で停止して終了を待つ
///
/// Shutdown is cooperative: a task already in progress runs to completion or
/// failure; only the pickup of new work stops.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request shutdown. Does not cancel in-flight task processing.
    pub fn request_shutdown(&self) {
        // ignore send error: receiver may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Shutdown and wait for the loop to exit.
    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

impl TaskWorker {
    pub fn new(
        store: Arc<dyn TaskStore>,
        queue: Arc<dyn TaskQueue>,
        source_a: Arc<dyn SourceReader>,
        source_b: Arc<dyn SourceReader>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            store,
            queue,
            source_a,
            source_b,
            clock,
            ids,
        }
    }

    /// Spawn the worker loop on the runtime.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run(shutdown_rx).await;
        });
        WorkerHandle { shutdown_tx, join }
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("task worker started");
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // pop は「待つ」可能性があるので select で shutdown と競合させる
            let popped = tokio::select! {
                _ = shutdown_rx.changed() => {
                    // 変更が入ったら次のループ先頭で判定
                    continue;
                }
                popped = self.queue.pop() => popped,
            };

            let Some(task_id) = popped else {
                // Queue closed and drained.
                break;
            };

            // Per-task failures are fully contained in process_task; the
            // loop keeps dequeuing no matter what happened to this task.
            self.process_task(task_id).await;
        }
        info!("task worker stopped");
    }

    /// Drive one task through PENDING -> IN_PROGRESS -> {COMPLETED | PENDING}.
    async fn process_task(&self, task_id: TaskId) {
        let mut task = match self.store.get_task(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => {
                // Open question resolved as: dropped no-op. The id is lost.
                warn!(%task_id, "dequeued id does not resolve to a task, dropping");
                return;
            }
            Err(e) => {
                error!(%task_id, error = %e, "task load failed, dropping");
                return;
            }
        };

        // Stale or double-enqueued ids resolve to a non-pending task; skip
        // rather than re-run.
        if task.status != TaskStatus::Pending {
            warn!(%task_id, status = ?task.status, "dequeued task is not pending, skipping");
            return;
        }

        info!(%task_id, title = %task.title, "processing task");

        task.begin();
        if let Err(e) = self.store.update_task(task.clone()).await {
            // Never marked in progress, so the task is still visibly pending.
            error!(%task_id, error = %e, "could not mark task in progress");
            return;
        }

        match self.ingest_enabled_sources(&task).await {
            Ok(order_count) => {
                task.complete(self.clock.now());
                match self.store.update_task(task).await {
                    Ok(()) => info!(%task_id, orders = order_count, "task completed"),
                    Err(e) => {
                        // Known limitation: a crash or write failure here
                        // leaves the task visibly stuck in IN_PROGRESS with
                        // no automatic recovery.
                        error!(%task_id, error = %e, "completion write failed, task left in progress");
                    }
                }
            }
            Err(e) => {
                warn!(%task_id, error = %e, "processing failed, reverting to pending");
                task.revert();
                if let Err(e) = self.store.update_task(task).await {
                    error!(%task_id, error = %e, "revert write failed, task left in progress");
                }
            }
        }
    }

    /// Fetch + filter + persist for each enabled source, A then B.
    ///
    /// The fixed order matters only for log/trace readability. A task with
    /// neither source enabled completes with zero orders.
    async fn ingest_enabled_sources(&self, task: &TaskRecord) -> Result<usize, SiphonError> {
        let mut total = 0;
        if task.source_a_enabled {
            total += self
                .ingest_source(task, self.source_a.as_ref(), task.source_a_filters.as_ref())
                .await?;
        }
        if task.source_b_enabled {
            total += self
                .ingest_source(task, self.source_b.as_ref(), task.source_b_filters.as_ref())
                .await?;
        }
        Ok(total)
    }

    async fn ingest_source(
        &self,
        task: &TaskRecord,
        reader: &dyn SourceReader,
        raw_filters: Option<&serde_json::Value>,
    ) -> Result<usize, SiphonError> {
        // Resolved once per fetch call, not per record, so a long scan is
        // judged against one consistent window.
        let window = DateWindow::resolve(task.date_from, task.date_to, self.clock.now());
        let filter = CategoryFilter::lenient_from_value(raw_filters);
        if raw_filters.is_some() && filter.is_unrestricted() {
            warn!(
                task_id = %task.id,
                source = %reader.tag(),
                "filter payload unusable or empty, ingesting all categories"
            );
        }

        let drafts = reader.fetch(&window, &filter).await?;
        let orders: Vec<OrderRecord> = drafts
            .into_iter()
            .map(|draft| OrderRecord::from_draft(self.ids.order_id(), task.id, reader.tag(), draft))
            .collect();

        let count = orders.len();
        self.store.insert_orders(orders).await?;
        info!(task_id = %task.id, source = %reader.tag(), orders = count, "source ingested");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, SourceTag, TaskStatus};
    use crate::engine::{CsvSourceReader, JsonSourceReader};
    use crate::impls::{InMemoryTaskStore, MpscTaskQueue};
    use crate::ports::{FixedClock, SystemClock, UlidGenerator};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use std::time::Duration;

    // Processing-time "now" for every test: defaults resolve against this.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn a_record(order_id: &str, date: &str, category: &str) -> serde_json::Value {
        json!({
            "order_id": order_id,
            "order_date": date,
            "source": "source_a",
            "product_name": "Smart Watch",
            "product_category": category,
            "quantity": "1",
            "unit_price": "199.99",
            "total_amount": "199.99",
            "customer_id": "CUST_1001",
            "customer_country": "Germany",
            "source_specific_data": "{\"shop_name\": \"Shop_3\"}"
        })
    }

    /// Source A: two records in the trailing-30-day window of `now()`
    /// (one Electronics, one Books), one older Electronics record,
    /// plus a January 2024 Electronics record.
    fn source_a_data() -> Vec<u8> {
        serde_json::to_vec(&json!([
            a_record("A_ORD_0001", "2024-06-10T09:00:00Z", "Electronics"),
            a_record("A_ORD_0002", "2024-06-01T15:30:00Z", "Books"),
            a_record("A_ORD_0003", "2023-02-01T10:00:00Z", "Electronics"),
            a_record("A_ORD_0004", "2024-01-15T10:00:00Z", "Electronics"),
        ]))
        .unwrap()
    }

    fn b_row(order_id: &str, date: &str, category: &str) -> String {
        format!("{order_id},{date},source_b,Jeans,{category},2,39.99,79.98,CUST_2002,Brazil,\"{{\"\"store_id\"\": \"\"STORE_1\"\"}}\"")
    }

    /// Source B: one row in the trailing-30-day window, one older row,
    /// plus a January 2024 Clothing row.
    fn source_b_data() -> Vec<u8> {
        let mut csv = String::from("order_id,order_date,source,product_name,product_category,quantity,unit_price,total_amount,customer_id,customer_country,source_specific_data\n");
        csv.push_str(&b_row("B_ORD_0001", "2024-06-12T11:00:00Z", "Clothing"));
        csv.push('\n');
        csv.push_str(&b_row("B_ORD_0002", "2023-08-20T11:00:00Z", "Clothing"));
        csv.push('\n');
        csv.push_str(&b_row("B_ORD_0003", "2024-01-20T11:00:00Z", "Clothing"));
        csv.push('\n');
        csv.into_bytes()
    }

    struct Harness {
        store: Arc<InMemoryTaskStore>,
        worker: TaskWorker,
        queue: Arc<MpscTaskQueue>,
        ids: Arc<UlidGenerator<SystemClock>>,
    }

    fn harness_with(source_a: Vec<u8>, source_b: Vec<u8>) -> Harness {
        let store = Arc::new(InMemoryTaskStore::new());
        let queue = Arc::new(MpscTaskQueue::new(16));
        let ids = Arc::new(UlidGenerator::new(SystemClock));
        let worker = TaskWorker::new(
            store.clone(),
            queue.clone(),
            Arc::new(JsonSourceReader::new(source_a)),
            Arc::new(CsvSourceReader::new(source_b)),
            Arc::new(FixedClock::new(now())),
            ids.clone(),
        );
        Harness {
            store,
            worker,
            queue,
            ids,
        }
    }

    fn harness() -> Harness {
        harness_with(source_a_data(), source_b_data())
    }

    async fn submitted(h: &Harness, input: NewTask) -> TaskRecord {
        let task = TaskRecord::create(h.ids.task_id(), input, now());
        h.store.insert_task(task.clone()).await.unwrap();
        task
    }

    #[tokio::test]
    async fn no_enabled_sources_still_completes_with_zero_orders() {
        let h = harness();
        let mut input = NewTask::new("nothing", "no sources");
        input.source_a_enabled = false;
        input.source_b_enabled = false;
        let task = submitted(&h, input).await;

        h.worker.process_task(task.id).await;

        let done = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.completed_at, Some(now()));
        assert!(done.invariant_holds());
        assert!(h.store.list_orders(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn january_electronics_from_source_a_only() {
        // Date window pinned to January 2024, source A restricted to
        // Electronics, source B disabled.
        let h = harness();
        let mut input = NewTask::new("january electronics", "");
        input.date_from = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        input.date_to = Some(Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap());
        input.source_a_filters = Some(json!({"categories": ["Electronics"]}));
        input.source_b_enabled = false;
        let task = submitted(&h, input).await;

        h.worker.process_task(task.id).await;

        let done = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        let orders = h.store.list_orders(task.id).await.unwrap();
        assert_eq!(orders.len(), 1);
        for order in &orders {
            assert_eq!(order.product_category, "Electronics");
            assert!(order.order_date >= Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
            assert!(order.order_date < Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
            assert_ne!(order.source, SourceTag::SourceB);
        }
    }

    #[tokio::test]
    async fn default_window_ingests_both_sources() {
        // Both sources enabled, no bounds, no filters.
        // In-window records: 2 from source A + 1 from source B.
        let h = harness();
        let task = submitted(&h, NewTask::new("defaults", "")).await;

        h.worker.process_task(task.id).await;

        let done = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert!(done.completed_at.is_some());

        let orders = h.store.list_orders(task.id).await.unwrap();
        assert_eq!(orders.len(), 3);
        assert_eq!(
            orders.iter().filter(|o| o.source == SourceTag::SourceA).count(),
            2
        );
        assert_eq!(
            orders.iter().filter(|o| o.source == SourceTag::SourceB).count(),
            1
        );
        // Every order is tagged with the owning task.
        assert!(orders.iter().all(|o| o.task_id == task.id));
    }

    #[tokio::test]
    async fn unparsable_date_in_source_a_reverts_with_zero_orders() {
        // Source A carries one unparsable date. A runs first,
        // so nothing has been persisted when the failure hits: zero orders.
        let broken_a = serde_json::to_vec(&json!([
            a_record("A_ORD_0001", "2024-06-10T09:00:00Z", "Electronics"),
            a_record("A_ORD_0002", "garbage", "Books"),
        ]))
        .unwrap();
        let h = harness_with(broken_a, source_b_data());
        let task = submitted(&h, NewTask::new("broken source a", "")).await;

        h.worker.process_task(task.id).await;

        let reverted = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(reverted.status, TaskStatus::Pending);
        assert!(reverted.completed_at.is_none());
        assert!(reverted.invariant_holds());
        assert!(h.store.list_orders(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn revert_keeps_orders_from_earlier_source() {
        // No-rollback rule: when source B fails after source A succeeded,
        // A's batch stays persisted even though the task reverts.
        let broken_b = b"order_id,order_date,product_name,product_category,quantity,unit_price,total_amount,customer_id,customer_country\nB_ORD_0001,not-a-date,Jeans,Clothing,2,39.99,79.98,C,Brazil\n".to_vec();
        let h = harness_with(source_a_data(), broken_b);
        let task = submitted(&h, NewTask::new("broken source b", "")).await;

        h.worker.process_task(task.id).await;

        let reverted = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(reverted.status, TaskStatus::Pending);
        assert!(reverted.completed_at.is_none());

        let orders = h.store.list_orders(task.id).await.unwrap();
        assert!(!orders.is_empty());
        assert!(orders.iter().all(|o| o.source == SourceTag::SourceA));
    }

    #[tokio::test]
    async fn unknown_task_id_is_dropped_without_panic() {
        let h = harness();
        let ghost = h.ids.task_id();

        h.worker.process_task(ghost).await;

        // Nothing was created as a side effect.
        assert!(h.store.list_tasks().await.unwrap().is_empty());
        assert!(h.store.list_all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn already_completed_task_is_skipped_on_pop() {
        let h = harness();
        let task = submitted(&h, NewTask::new("done", "")).await;

        let mut done = h.store.get_task(task.id).await.unwrap().unwrap();
        done.begin();
        done.complete(now());
        h.store.update_task(done).await.unwrap();

        h.worker.process_task(task.id).await;

        // No reprocessing: still completed, nothing ingested.
        let after = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(after.status, TaskStatus::Completed);
        assert!(h.store.list_orders(task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_filter_payload_ingests_all_categories() {
        let h = harness();
        let mut input = NewTask::new("bad filter", "");
        input.source_a_filters = Some(json!("{this is not json"));
        input.source_b_enabled = false;
        let task = submitted(&h, input).await;

        h.worker.process_task(task.id).await;

        let done = h.store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        // Same result set as no filter at all: both in-window A records.
        assert_eq!(h.store.list_orders(task.id).await.unwrap().len(), 2);
    }

    /// Store that accepts tasks but refuses order batches.
    struct OrderRejectingStore {
        inner: InMemoryTaskStore,
    }

    #[async_trait]
    impl TaskStore for OrderRejectingStore {
        async fn insert_task(&self, task: TaskRecord) -> Result<(), SiphonError> {
            self.inner.insert_task(task).await
        }
        async fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, SiphonError> {
            self.inner.get_task(id).await
        }
        async fn list_tasks(&self) -> Result<Vec<TaskRecord>, SiphonError> {
            self.inner.list_tasks().await
        }
        async fn update_task(&self, task: TaskRecord) -> Result<(), SiphonError> {
            self.inner.update_task(task).await
        }
        async fn insert_orders(&self, _orders: Vec<OrderRecord>) -> Result<(), SiphonError> {
            Err(SiphonError::Store("disk full".to_string()))
        }
        async fn list_orders(&self, task_id: TaskId) -> Result<Vec<OrderRecord>, SiphonError> {
            self.inner.list_orders(task_id).await
        }
        async fn list_all_orders(&self) -> Result<Vec<OrderRecord>, SiphonError> {
            self.inner.list_all_orders().await
        }
    }

    #[tokio::test]
    async fn persistence_failure_reverts_the_task() {
        let store = Arc::new(OrderRejectingStore {
            inner: InMemoryTaskStore::new(),
        });
        let queue = Arc::new(MpscTaskQueue::new(4));
        let ids = Arc::new(UlidGenerator::new(SystemClock));
        let worker = TaskWorker::new(
            store.clone(),
            queue,
            Arc::new(JsonSourceReader::new(source_a_data())),
            Arc::new(CsvSourceReader::new(source_b_data())),
            Arc::new(FixedClock::new(now())),
            ids.clone(),
        );

        let task = TaskRecord::create(ids.task_id(), NewTask::new("doomed", ""), now());
        store.insert_task(task.clone()).await.unwrap();

        worker.process_task(task.id).await;

        let reverted = store.get_task(task.id).await.unwrap().unwrap();
        assert_eq!(reverted.status, TaskStatus::Pending);
        assert!(reverted.completed_at.is_none());
    }

    #[tokio::test]
    async fn spawned_worker_survives_a_failing_task_and_processes_the_next() {
        let broken_a = serde_json::to_vec(&json!([
            a_record("A_ORD_0001", "garbage", "Books"),
        ]))
        .unwrap();
        let h = harness_with(broken_a, source_b_data());

        let mut failing_input = NewTask::new("will fail", "");
        failing_input.source_b_enabled = false;
        let failing = submitted(&h, failing_input).await;

        let mut ok_input = NewTask::new("will pass", "");
        ok_input.source_a_enabled = false;
        let ok = submitted(&h, ok_input).await;

        let handle = h.worker.spawn();
        h.queue.push(failing.id).await.unwrap();
        h.queue.push(ok.id).await.unwrap();

        // Poll the second task to completion; the loop must have survived
        // the first task's failure to get there.
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let status = h.store.get_task(ok.id).await.unwrap().unwrap().status;
            if status == TaskStatus::Completed {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "second task never completed"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(
            h.store.get_task(failing.id).await.unwrap().unwrap().status,
            TaskStatus::Pending
        );

        handle.shutdown_and_join().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_loop() {
        let h = harness();
        let handle = h.worker.spawn();

        // Must return promptly even though the queue is empty and pop blocks.
        tokio::time::timeout(Duration::from_secs(1), handle.shutdown_and_join())
            .await
            .expect("worker did not stop on shutdown");
    }
}
