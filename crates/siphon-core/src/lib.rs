//! siphon-core
//!
//! Core building blocks for the Siphon order-ingestion runtime.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, order, filter, errors）
//! - **ports**: 抽象化レイヤー（TaskStore, TaskQueue, SourceReader, Clock, IdGenerator）
//! - **engine**: 取り込みパイプライン（coerce, filter, source_a, source_b）
//! - **app**: アプリケーションロジック（TaskService, TaskWorker）
//! - **impls**: 実装（InMemoryTaskStore, MpscTaskQueue など開発用）

pub mod app;
pub mod domain;
pub mod engine;
pub mod impls;
pub mod ports;
