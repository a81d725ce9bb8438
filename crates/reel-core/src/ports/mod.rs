//! Ports - 抽象化レイヤー
//!
//! 外部システム（リモート処理サービス、乱数、時計）と共有リソース（artifact store）
//! へのインターフェース。実装は `impls` にある。

pub mod artifact_store;
pub mod clock;
pub mod decider;
pub mod discovery;
pub mod event_sink;
pub mod id_generator;
pub mod task_service;

pub use self::artifact_store::ArtifactStore;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::decider::{Decider, FixedDecider, ProbabilisticDecider};
pub use self::discovery::DiscoveryResolver;
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::task_service::TaskService;
