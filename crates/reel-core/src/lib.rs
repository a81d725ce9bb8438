//! reel-core
//!
//! Core building blocks for the Reel video-processing client.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, artifact, state, upload, message, discovery, errors, events）
//! - **ports**: 抽象化レイヤー（TaskService, ArtifactStore, DiscoveryResolver, Decider, Clock, など）
//! - **app**: アプリケーションロジック（builder, session, poller, submitter, discovery, playback）
//! - **impls**: 実装（HttpApi, InMemoryArtifactStore, SimulatedDiscovery, テスト用 double）
//! - **config**: ClientConfig（TOML / JSON + 環境変数）
//!
//! # 使用例
//! ```ignore
//! let (config, _) = ClientConfig::load_from_env()?;
//! let session = SessionBuilder::new(config.clone())
//!     .task_service(Arc::new(HttpApi::from_config(&config)?))
//!     .build()?;
//!
//! session.stage(PendingUpload::from_path("clip.mp4").await?);
//! if let Some(ticket) = session.submit().await? {
//!     println!("{:?}", ticket.outcome().await);
//! }
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{BuildError, PollOutcome, Session, SessionBuilder, SessionSnapshot, TaskTicket};
pub use config::{ClientConfig, ConfigError, ConfigSource};
pub use domain::{Artifact, PendingUpload, PollerState, SessionEvent, TaskHandle};
