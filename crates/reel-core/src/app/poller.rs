//! TaskPoller - active task handle を固定間隔でポーリングする状態機械
//!
//! # 状態遷移
//! ```text
//! Idle --start--> Submitted --status--> Polling --completed--> ResolvedSuccess --> Idle
//!                     |                    |------failed/not_found/error/budget--> ResolvedFailure --> Idle
//!                     |--completed/failed (初回)--> Resolved* --> Idle
//! ```
//!
//! # 実装詳細
//! - 1 handle につき 1 spawn。loop は応答を待ってから次の tick を待つので問い合わせは重ならない
//! - interval は `MissedTickBehavior::Delay`（遅れた tick をまとめて撃たない）
//! - handle ごとに child CancellationToken と generation を持つ
//! - 応答は active の generation と一致する時だけ反映（古い応答は捨てる）
//! - 反映・store への append・active のクリアは同じロックの中で行う。
//!   teardown も同じロックを取るので、teardown 後に store が変わることはない
//! - EventSink への emit はロックを外してから

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::domain::{
    Artifact, ArtifactOrigin, PollerState, PollingError, ServiceError, SessionEvent, StatusReport,
    TaskHandle, TaskStatus, ordinal_title,
};
use crate::ports::{ArtifactStore, Clock, EventSink, IdGenerator, TaskService};

/// Poll timing and defaults for completed tasks.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub interval: Duration,
    /// `None` polls until a terminal status arrives.
    pub max_attempts: Option<u32>,
    pub placeholder_preview_url: String,
}

/// How a polled task ended.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Completed(Artifact),
    Failed(PollingError),
}

impl PollOutcome {
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Completed(artifact) => Some(artifact),
            Self::Failed(_) => None,
        }
    }
}

/// Receives the outcome of one submitted task.
///
/// Resolves to `None` when the task was superseded or the session was torn
/// down before a terminal status arrived.
#[derive(Debug)]
pub struct TaskTicket {
    handle: TaskHandle,
    rx: oneshot::Receiver<PollOutcome>,
}

impl TaskTicket {
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub async fn outcome(self) -> Option<PollOutcome> {
        self.rx.await.ok()
    }
}

struct Active {
    handle: TaskHandle,
    generation: u64,
    cancel: CancellationToken,
    reply: oneshot::Sender<PollOutcome>,
}

/// Collaborators shared by the poller and its spawned loops.
pub(crate) struct PollerDeps {
    pub service: Arc<dyn TaskService>,
    pub store: Arc<dyn ArtifactStore>,
    pub events: Arc<dyn EventSink>,
    pub ids: Arc<dyn IdGenerator>,
    pub clock: Arc<dyn Clock>,
    pub processing: Arc<AtomicBool>,
}

struct Shared {
    deps: PollerDeps,
    settings: PollerSettings,
    state: watch::Sender<PollerState>,
    active: Mutex<Option<Active>>,
    generation: AtomicU64,
}

enum Step {
    Continue,
    Stop,
}

pub struct TaskPoller {
    shared: Arc<Shared>,
    root: CancellationToken,
}

impl TaskPoller {
    pub(crate) fn new(deps: PollerDeps, settings: PollerSettings, root: CancellationToken) -> Self {
        let (state, _) = watch::channel(PollerState::Idle);
        Self {
            shared: Arc::new(Shared {
                deps,
                settings,
                state,
                active: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
            root,
        }
    }

    /// Starts polling `handle`, superseding any task that is still active.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self, handle: TaskHandle) -> TaskTicket {
        let (reply, rx) = oneshot::channel();
        let ticket = TaskTicket {
            handle: handle.clone(),
            rx,
        };

        if self.root.is_cancelled() {
            tracing::debug!(task = %handle, "poller is torn down, not starting");
            return ticket;
        }

        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.root.child_token();

        let (superseded, from) = {
            let mut active = self.shared.lock_active();
            let superseded = active.take();
            if let Some(old) = &superseded {
                old.cancel.cancel();
            }
            *active = Some(Active {
                handle: handle.clone(),
                generation,
                cancel: cancel.clone(),
                reply,
            });
            let from = self.shared.state.send_replace(PollerState::Submitted);
            (superseded, from)
        };

        if let Some(old) = superseded {
            tracing::warn!(old = %old.handle, new = %handle, "superseding active task");
        }
        self.shared.deps.events.emit(SessionEvent::PollerTransition {
            task: handle.clone(),
            from,
            to: PollerState::Submitted,
        });

        tokio::spawn(run(Arc::clone(&self.shared), handle, generation, cancel));
        ticket
    }

    /// Stops polling without emitting transitions or touching the store.
    pub fn shutdown(&self) {
        self.root.cancel();
        let active = self.shared.lock_active().take();
        if let Some(active) = active {
            active.cancel.cancel();
            tracing::debug!(task = %active.handle, "polling cancelled by teardown");
        }
        self.shared.state.send_replace(PollerState::Idle);
        self.shared.deps.processing.store(false, Ordering::SeqCst);
    }

    pub fn state(&self) -> PollerState {
        *self.shared.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.shared.state.subscribe()
    }

    pub fn active_task(&self) -> Option<TaskHandle> {
        self.shared
            .lock_active()
            .as_ref()
            .map(|active| active.handle.clone())
    }
}

impl std::fmt::Debug for TaskPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPoller")
            .field("state", &self.state())
            .field("settings", &self.shared.settings)
            .finish_non_exhaustive()
    }
}

async fn run(shared: Arc<Shared>, handle: TaskHandle, generation: u64, cancel: CancellationToken) {
    let period = shared.settings.interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        attempts = attempts.saturating_add(1);
        tracing::debug!(task = %handle, attempt = attempts, "querying task status");

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = shared.deps.service.status(&handle) => result,
        };

        match shared.observe(generation, &handle, result, attempts) {
            Step::Continue => {}
            Step::Stop => return,
        }
    }
}

enum Resolution {
    Success(Artifact),
    Failure(PollingError),
}

impl Shared {
    fn lock_active(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn observe(
        &self,
        generation: u64,
        handle: &TaskHandle,
        result: Result<StatusReport, ServiceError>,
        attempts: u32,
    ) -> Step {
        let mut events = Vec::new();
        let mut active = self.lock_active();

        let current = match active.as_ref() {
            Some(a) if a.generation == generation && !a.cancel.is_cancelled() => *self.state.borrow(),
            _ => {
                tracing::debug!(task = %handle, generation, "dropping stale status response");
                return Step::Stop;
            }
        };

        let resolution = match result {
            Err(err) => Resolution::Failure(PollingError::Query(err)),
            Ok(report) => match report.status.clone() {
                TaskStatus::Completed => self.complete(handle, report, &mut events),
                TaskStatus::Failed => Resolution::Failure(PollingError::Failed),
                TaskStatus::NotFound => Resolution::Failure(PollingError::NotFound),
                status @ (TaskStatus::Pending | TaskStatus::InProgress | TaskStatus::Unrecognized(_)) => {
                    if let TaskStatus::Unrecognized(_) = &status {
                        events.push(SessionEvent::UnknownStatus {
                            task: handle.clone(),
                            status,
                        });
                    }
                    match self.settings.max_attempts {
                        Some(limit) if attempts >= limit => {
                            Resolution::Failure(PollingError::TimedOut { attempts })
                        }
                        _ => {
                            self.state.send_replace(PollerState::Polling);
                            events.push(SessionEvent::PollerTransition {
                                task: handle.clone(),
                                from: current,
                                to: PollerState::Polling,
                            });
                            drop(active);
                            self.emit_all(events);
                            return Step::Continue;
                        }
                    }
                }
            },
        };

        let Some(finished) = active.take() else {
            return Step::Stop;
        };
        finished.cancel.cancel();
        self.state.send_replace(PollerState::Idle);
        self.deps.processing.store(false, Ordering::SeqCst);
        drop(active);

        let (terminal, outcome) = match resolution {
            Resolution::Success(artifact) => {
                tracing::info!(task = %handle, artifact = %artifact.id, title = %artifact.title, "task completed");
                events.push(SessionEvent::ArtifactAdded {
                    artifact: artifact.id,
                    title: artifact.title.clone(),
                });
                (PollerState::ResolvedSuccess, PollOutcome::Completed(artifact))
            }
            Resolution::Failure(err) => {
                tracing::error!(task = %handle, error = %err, attempts, "task failed");
                events.push(SessionEvent::TaskFailed {
                    task: handle.clone(),
                    error: err.to_string(),
                });
                (PollerState::ResolvedFailure, PollOutcome::Failed(err))
            }
        };
        events.push(SessionEvent::PollerTransition {
            task: handle.clone(),
            from: current,
            to: terminal,
        });
        events.push(SessionEvent::PollerTransition {
            task: handle.clone(),
            from: terminal,
            to: PollerState::Idle,
        });
        self.emit_all(events);

        // the ticket may already be gone
        let _ = finished.reply.send(outcome);
        Step::Stop
    }

    /// Appends the artifact for a completed report. Called with `active` locked.
    fn complete(
        &self,
        handle: &TaskHandle,
        report: StatusReport,
        events: &mut Vec<SessionEvent>,
    ) -> Resolution {
        let mut missing = Vec::new();
        if report.title.is_none() {
            missing.push("title");
        }
        if report.video_url.is_none() {
            missing.push("videoUrl");
        }
        if report.thumbnail_url.is_none() {
            missing.push("thumbnailUrl");
        }

        let StatusReport {
            title,
            video_url,
            thumbnail_url,
            ..
        } = report;
        let mut title = title;
        let mut video_url = video_url;
        let mut thumbnail_url = thumbnail_url;

        let appended = self.deps.store.append_with(&mut |count| Artifact {
            id: self.deps.ids.generate_artifact_id(),
            title: title.take().unwrap_or_else(|| ordinal_title(count + 1)),
            media_url: video_url.take().unwrap_or_default(),
            preview_url: thumbnail_url
                .take()
                .unwrap_or_else(|| self.settings.placeholder_preview_url.clone()),
            origin: ArtifactOrigin::Task {
                task_id: handle.clone(),
            },
            created_at: self.deps.clock.now(),
        });

        match appended {
            Ok(artifact) => {
                if !missing.is_empty() {
                    events.push(SessionEvent::DegradedResult {
                        task: handle.clone(),
                        missing,
                    });
                }
                Resolution::Success(artifact)
            }
            Err(err) => Resolution::Failure(PollingError::Store(err)),
        }
    }

    fn emit_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.deps.events.emit(event);
        }
    }
}
