//! SessionBuilder - セッションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: task service 未設定・設定値の不正は build() で弾く
//! - 省略された依存はデフォルト実装で埋める

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, ConfigError};
use crate::impls::{InMemoryArtifactStore, SimulatedDiscovery, TracingEventSink};
use crate::ports::{
    ArtifactStore, Clock, Decider, DiscoveryResolver, EventSink, IdGenerator, ProbabilisticDecider,
    SystemClock, TaskService, UlidGenerator,
};

use super::discovery::DiscoveryTrigger;
use super::playback::PlaybackSelector;
use super::poller::{PollerDeps, PollerSettings, TaskPoller};
use super::session::Session;
use super::submitter::UploadSubmitter;
use super::transcript::Transcript;

/// SessionBuilder は Session を構築
///
/// # 使用例
/// ```ignore
/// let session = SessionBuilder::new(config)
///     .task_service(Arc::new(HttpApi::from_config(&config)?))
///     .build()?;
/// ```
///
/// # デフォルト
/// - store: InMemoryArtifactStore
/// - event sink: TracingEventSink
/// - clock: SystemClock / ids: UlidGenerator
/// - discovery: SimulatedDiscovery（decider 未指定なら ProbabilisticDecider）
pub struct SessionBuilder {
    config: ClientConfig,
    service: Option<Arc<dyn TaskService>>,
    store: Option<Arc<dyn ArtifactStore>>,
    events: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    resolver: Option<Arc<dyn DiscoveryResolver>>,
    decider: Option<Arc<dyn Decider>>,
}

/// BuildError はセッション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No task service configured. Call `task_service(..)` before `build()`.")]
    MissingTaskService,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl SessionBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            service: None,
            store: None,
            events: None,
            clock: None,
            ids: None,
            resolver: None,
            decider: None,
        }
    }

    pub fn task_service(mut self, service: Arc<dyn TaskService>) -> Self {
        self.service = Some(service);
        self
    }

    pub fn artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Replaces the simulated resolver.
    pub fn discovery_resolver(mut self, resolver: Arc<dyn DiscoveryResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Only used by the default simulated resolver.
    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Session を構築
    ///
    /// # 検証
    /// - task service が設定されていなければ BuildError::MissingTaskService
    /// - config.validate() が失敗すれば BuildError::InvalidConfig
    pub fn build(self) -> Result<Session, BuildError> {
        let service = self.service.ok_or(BuildError::MissingTaskService)?;
        self.config.validate()?;
        let config = self.config;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryArtifactStore::new()));
        let events = self.events.unwrap_or_else(|| Arc::new(TracingEventSink));
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => {
                let decider = self.decider.unwrap_or_else(|| {
                    Arc::new(ProbabilisticDecider::new(config.discovery.video_probability))
                });
                Arc::new(
                    SimulatedDiscovery::new(&config.discovery)
                        .with_decider(decider)
                        .with_clock(Arc::clone(&clock)),
                )
            }
        };

        let cancel = CancellationToken::new();
        let processing = Arc::new(AtomicBool::new(false));
        let transcript = Arc::new(Transcript::new(Arc::clone(&ids), Arc::clone(&clock)));

        let poller = TaskPoller::new(
            PollerDeps {
                service: Arc::clone(&service),
                store: Arc::clone(&store),
                events: Arc::clone(&events),
                ids: Arc::clone(&ids),
                clock: Arc::clone(&clock),
                processing: Arc::clone(&processing),
            },
            PollerSettings {
                interval: config.poll_interval,
                max_attempts: config.poll_budget(),
                placeholder_preview_url: config.placeholder_preview_url.clone(),
            },
            cancel.child_token(),
        );
        let discovery = DiscoveryTrigger::new(
            resolver,
            Arc::clone(&store),
            Arc::clone(&transcript),
            Arc::clone(&events),
            ids,
            clock,
            cancel.child_token(),
        );

        tracing::debug!(
            api_base_url = %config.api_base_url,
            poll_interval = ?config.poll_interval,
            max_poll_attempts = config.max_poll_attempts,
            "session built"
        );

        Ok(Session {
            store,
            events,
            submitter: UploadSubmitter::new(service),
            poller,
            discovery,
            transcript,
            playback: PlaybackSelector::new(),
            staged: Mutex::new(None),
            processing,
            cancel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GREETING, PollerState};
    use crate::impls::ScriptedTaskService;
    use std::time::Duration;

    #[test]
    fn test_build_success_with_defaults() {
        let session = SessionBuilder::new(ClientConfig::default())
            .task_service(Arc::new(ScriptedTaskService::new()))
            .build()
            .unwrap();

        assert!(session.current_artifacts().is_empty());
        assert!(!session.is_processing());
        assert_eq!(session.poller_state(), PollerState::Idle);
        assert_eq!(session.transcript()[0].text, GREETING);
    }

    #[test]
    fn test_build_missing_task_service() {
        let result = SessionBuilder::new(ClientConfig::default()).build();
        assert!(matches!(result, Err(BuildError::MissingTaskService)));
    }

    #[test]
    fn test_build_invalid_config() {
        let config = ClientConfig {
            poll_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        let result = SessionBuilder::new(config)
            .task_service(Arc::new(ScriptedTaskService::new()))
            .build();
        assert!(matches!(
            result,
            Err(BuildError::InvalidConfig(ConfigError::InvalidValue { key: "poll_interval", .. }))
        ));
    }
}
