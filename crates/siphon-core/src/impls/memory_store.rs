//! InMemoryTaskStore - 開発・テスト用の正本
//!
//! # 実装詳細
//! - 内側の素の state 構造体を tokio Mutex で包む
//! - 1 メソッド呼び出し = 1 ロック区間なので、reader からは遷移前か遷移後の
//!   どちらかしか見えない（torn write なし）
//! - オーダーは挿入順の Vec（要求されるルックアップは task_id 絞り込みと
//!   full scan のみ）

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{OrderRecord, SiphonError, TaskId, TaskRecord};
use crate::ports::TaskStore;

/// Plain state behind the lock.
#[derive(Default)]
struct StoreState {
    tasks: HashMap<TaskId, TaskRecord>,
    orders: Vec<OrderRecord>,
}

/// In-memory [`TaskStore`] implementation. The reference store; a real
/// database implementation would live in its own crate behind the same trait.
#[derive(Default)]
pub struct InMemoryTaskStore {
    state: Mutex<StoreState>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert_task(&self, task: TaskRecord) -> Result<(), SiphonError> {
        let mut state = self.state.lock().await;
        if state.tasks.contains_key(&task.id) {
            return Err(SiphonError::Store(format!("duplicate task id {}", task.id)));
        }
        state.tasks.insert(task.id, task);
        Ok(())
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, SiphonError> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<TaskRecord>, SiphonError> {
        let state = self.state.lock().await;
        Ok(state.tasks.values().cloned().collect())
    }

    async fn update_task(&self, task: TaskRecord) -> Result<(), SiphonError> {
        let mut state = self.state.lock().await;
        match state.tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task;
                Ok(())
            }
            None => Err(SiphonError::Store(format!(
                "update of unknown task {}",
                task.id
            ))),
        }
    }

    async fn insert_orders(&self, orders: Vec<OrderRecord>) -> Result<(), SiphonError> {
        let mut state = self.state.lock().await;
        state.orders.extend(orders);
        Ok(())
    }

    async fn list_orders(&self, task_id: TaskId) -> Result<Vec<OrderRecord>, SiphonError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .iter()
            .filter(|o| o.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn list_all_orders(&self) -> Result<Vec<OrderRecord>, SiphonError> {
        let state = self.state.lock().await;
        Ok(state.orders.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, OrderDraft, OrderId, SourceTag};
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn task() -> TaskRecord {
        TaskRecord::create(
            TaskId::from_ulid(Ulid::new()),
            NewTask::new("t", "d"),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn order_for(task_id: TaskId, source: SourceTag) -> OrderRecord {
        OrderRecord::from_draft(
            OrderId::from_ulid(Ulid::new()),
            task_id,
            source,
            OrderDraft {
                order_id: "ORD".to_string(),
                order_date: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
                product_name: "p".to_string(),
                product_category: "Books".to_string(),
                quantity: 1,
                unit_price: 5.0,
                total_amount: 5.0,
                customer_id: "c".to_string(),
                customer_country: "Japan".to_string(),
                source_specific: serde_json::Value::Null,
            },
        )
    }

    #[tokio::test]
    async fn insert_then_get_roundtrips() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.insert_task(t.clone()).await.unwrap();

        let found = store.get_task(t.id).await.unwrap().unwrap();
        assert_eq!(found.title, "t");

        let missing = TaskId::from_ulid(Ulid::new());
        assert!(store.get_task(missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryTaskStore::new();
        let t = task();
        store.insert_task(t.clone()).await.unwrap();
        assert!(matches!(
            store.insert_task(t).await,
            Err(SiphonError::Store(_))
        ));
    }

    #[tokio::test]
    async fn update_replaces_the_record() {
        let store = InMemoryTaskStore::new();
        let mut t = task();
        store.insert_task(t.clone()).await.unwrap();

        t.begin();
        store.update_task(t.clone()).await.unwrap();

        let found = store.get_task(t.id).await.unwrap().unwrap();
        assert_eq!(found.status, crate::domain::TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn update_of_unknown_task_fails() {
        let store = InMemoryTaskStore::new();
        assert!(matches!(
            store.update_task(task()).await,
            Err(SiphonError::Store(_))
        ));
    }

    #[tokio::test]
    async fn orders_are_scoped_to_their_task() {
        let store = InMemoryTaskStore::new();
        let t1 = task();
        let t2 = task();
        store.insert_task(t1.clone()).await.unwrap();
        store.insert_task(t2.clone()).await.unwrap();

        store
            .insert_orders(vec![
                order_for(t1.id, SourceTag::SourceA),
                order_for(t1.id, SourceTag::SourceB),
                order_for(t2.id, SourceTag::SourceA),
            ])
            .await
            .unwrap();

        assert_eq!(store.list_orders(t1.id).await.unwrap().len(), 2);
        assert_eq!(store.list_orders(t2.id).await.unwrap().len(), 1);
        assert_eq!(store.list_all_orders().await.unwrap().len(), 3);

        // A task with no orders is an empty list, not an error.
        let t3 = task();
        store.insert_task(t3.clone()).await.unwrap();
        assert!(store.list_orders(t3.id).await.unwrap().is_empty());
    }
}
