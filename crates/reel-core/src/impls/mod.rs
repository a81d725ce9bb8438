//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryArtifactStore**: セッション内の artifact 一覧（正本）
//! - **HttpApi**: リモート処理サービス（TaskService + `/chat` DiscoveryResolver）
//! - **SimulatedDiscovery**: 固定レイテンシの discovery
//! - **ScriptedTaskService**: 台本通りに応答するテスト用 TaskService（`testing` feature）
//! - **TracingEventSink / RecordingEventSink / NoopEventSink**: 診断イベントの受け口

pub mod event_sinks;
pub mod http_api;
pub mod memory_store;
#[cfg(any(test, feature = "testing"))]
pub mod scripted_service;
pub mod simulated_discovery;

// 主要な型を再エクスポート
pub use self::event_sinks::{NoopEventSink, RecordingEventSink, TracingEventSink};
pub use self::http_api::HttpApi;
pub use self::memory_store::InMemoryArtifactStore;
#[cfg(any(test, feature = "testing"))]
pub use self::scripted_service::ScriptedTaskService;
pub use self::simulated_discovery::SimulatedDiscovery;
