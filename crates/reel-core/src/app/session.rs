//! Session - 画面側から使うファサード
//!
//! # 責務
//! - アップロードの staging と submit（同時に 1 件まで）
//! - TaskPoller / DiscoveryTrigger / PlaybackSelector / Transcript の束ね役
//! - teardown（drop 時にも実行）で全ての待機中処理を止める
//!
//! `SessionBuilder` で構築する。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::domain::{
    Artifact, Message, PendingUpload, PollerState, SessionEvent, SubmissionError,
};
use crate::ports::{ArtifactStore, EventSink};

use super::discovery::{DiscoveryTicket, DiscoveryTrigger};
use super::playback::PlaybackSelector;
use super::poller::{TaskPoller, TaskTicket};
use super::status::SessionSnapshot;
use super::submitter::UploadSubmitter;
use super::transcript::Transcript;

pub struct Session {
    pub(crate) store: Arc<dyn ArtifactStore>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) submitter: UploadSubmitter,
    pub(crate) poller: TaskPoller,
    pub(crate) discovery: DiscoveryTrigger,
    pub(crate) transcript: Arc<Transcript>,
    pub(crate) playback: PlaybackSelector,
    pub(crate) staged: Mutex<Option<PendingUpload>>,
    pub(crate) processing: Arc<AtomicBool>,
    pub(crate) cancel: CancellationToken,
}

impl Session {
    /// Newest first.
    pub fn current_artifacts(&self) -> Vec<Artifact> {
        self.store.list()
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// `None` closes the player. Never touches the store.
    pub fn select(&self, artifact: Option<Artifact>) {
        self.playback.select(artifact);
    }

    pub fn playback(&self) -> &PlaybackSelector {
        &self.playback
    }

    /// Replaces whatever was staged before.
    pub fn stage(&self, upload: PendingUpload) {
        let event = SessionEvent::UploadStaged {
            file_name: upload.file_name().to_string(),
            bytes: upload.len(),
        };
        *self.lock_staged() = Some(upload);
        self.events.emit(event);
    }

    pub fn discard_staged(&self) -> Option<PendingUpload> {
        let discarded = self.lock_staged().take();
        if let Some(upload) = &discarded {
            self.events.emit(SessionEvent::UploadDiscarded {
                file_name: upload.file_name().to_string(),
            });
        }
        discarded
    }

    pub fn staged_name(&self) -> Option<String> {
        self.lock_staged()
            .as_ref()
            .map(|upload| upload.file_name().to_string())
    }

    /// Submits the staged upload and starts polling its task.
    ///
    /// `Ok(None)` when nothing is staged. A task that is still being
    /// processed makes this fail with [`SubmissionError::Busy`]. On failure
    /// the upload stays staged. After teardown nothing is sent and
    /// [`SubmissionError::TornDown`] is returned.
    pub async fn submit(&self) -> Result<Option<TaskTicket>, SubmissionError> {
        if self.cancel.is_cancelled() {
            return Err(SubmissionError::TornDown);
        }
        if self
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("submit refused, a task is already being processed");
            return Err(SubmissionError::Busy);
        }

        let Some(upload) = self.lock_staged().take() else {
            self.processing.store(false, Ordering::SeqCst);
            return Ok(None);
        };

        let submitted = self.submitter.submit(&upload).await;
        if self.cancel.is_cancelled() {
            tracing::debug!(file_name = %upload.file_name(), "session torn down during submit");
            self.processing.store(false, Ordering::SeqCst);
            return Err(SubmissionError::TornDown);
        }

        match submitted {
            Ok(handle) => {
                self.events.emit(SessionEvent::TaskSubmitted {
                    task: handle.clone(),
                });
                Ok(Some(self.poller.start(handle)))
            }
            Err(err) => {
                let file_name = upload.file_name().to_string();
                {
                    let mut staged = self.lock_staged();
                    if staged.is_none() {
                        *staged = Some(upload);
                    }
                }
                self.processing.store(false, Ordering::SeqCst);
                self.events.emit(SessionEvent::SubmissionFailed {
                    file_name,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// `None` for blank text.
    pub fn send_query(&self, text: &str) -> Option<DiscoveryTicket> {
        self.discovery.send_query(text)
    }

    pub fn send_image(&self, bytes: Vec<u8>, file_name: &str) -> DiscoveryTicket {
        self.discovery.send_image(bytes, file_name)
    }

    pub fn transcript(&self) -> Vec<Message> {
        self.transcript.messages()
    }

    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            artifacts: self.store.len(),
            messages: self.transcript.len(),
            processing: self.is_processing(),
            poller_state: self.poller.state(),
            active_task: self.poller.active_task(),
            staged: self.staged_name(),
            playing: self.playback.selected().map(|artifact| artifact.title),
        }
    }

    /// Cancels polling and pending discovery requests. Idempotent.
    pub fn teardown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        tracing::debug!("tearing down session");
        self.discovery.shutdown();
        self.cancel.cancel();
        self.poller.shutdown();
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn lock_staged(&self) -> MutexGuard<'_, Option<PendingUpload>> {
        self.staged.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::super::builder::SessionBuilder;
    use super::super::poller::PollOutcome;
    use super::*;
    use crate::config::ClientConfig;
    use crate::domain::{PollingError, ServiceError, StatusReport};
    use crate::impls::{RecordingEventSink, ScriptedTaskService};
    use crate::ports::FixedDecider;
    use std::time::Duration;

    fn config() -> ClientConfig {
        ClientConfig {
            poll_interval: Duration::from_millis(2000),
            ..ClientConfig::default()
        }
    }

    fn session(service: Arc<ScriptedTaskService>, events: Arc<RecordingEventSink>) -> Session {
        SessionBuilder::new(config())
            .task_service(service)
            .event_sink(events)
            .decider(Arc::new(FixedDecider(true)))
            .build()
            .unwrap()
    }

    fn clip() -> PendingUpload {
        PendingUpload::new(vec![0; 16], "clip.mp4")
    }

    #[tokio::test(start_paused = true)]
    async fn submit_with_nothing_staged_is_a_noop() {
        let service = Arc::new(ScriptedTaskService::new());
        let session = session(service.clone(), Arc::new(RecordingEventSink::new()));

        assert!(session.submit().await.unwrap().is_none());
        assert!(!session.is_processing());
        assert!(service.uploads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn successful_task_appends_one_artifact() {
        let service = Arc::new(
            ScriptedTaskService::new()
                .accept_as("abc")
                .script("abc", [Ok(StatusReport::pending()), Ok(StatusReport::completed().with_title("Final"))]),
        );
        let session = session(service, Arc::new(RecordingEventSink::new()));
        session.stage(clip());

        let ticket = session.submit().await.unwrap().unwrap();
        assert!(session.is_processing());
        assert_eq!(session.staged_name(), None);
        assert_eq!(session.poller_state(), PollerState::Submitted);

        let outcome = ticket.outcome().await.unwrap();
        assert!(matches!(outcome, PollOutcome::Completed(_)));
        assert!(!session.is_processing());
        let titles: Vec<_> = session.current_artifacts().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["Final"]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_task_appends_nothing() {
        let service = Arc::new(
            ScriptedTaskService::new()
                .accept_as("abc")
                .script("abc", [Ok(StatusReport::not_found())]),
        );
        let session = session(service, Arc::new(RecordingEventSink::new()));
        session.stage(clip());

        let outcome = session.submit().await.unwrap().unwrap().outcome().await.unwrap();

        assert!(matches!(outcome, PollOutcome::Failed(PollingError::NotFound)));
        assert!(session.current_artifacts().is_empty());
        assert!(!session.is_processing());
    }

    #[tokio::test(start_paused = true)]
    async fn submission_failure_keeps_upload_staged() {
        let service = Arc::new(ScriptedTaskService::new().reject_with(ServiceError::Rejected {
            status: 502,
            body: "bad gateway".into(),
        }));
        let events = Arc::new(RecordingEventSink::new());
        let session = session(service, events.clone());
        session.stage(clip());

        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, SubmissionError::Service(ServiceError::Rejected { status: 502, .. })));
        assert_eq!(session.staged_name().as_deref(), Some("clip.mp4"));
        assert!(!session.is_processing());
        assert_eq!(session.poller_state(), PollerState::Idle);
        assert_eq!(events.names(), vec!["upload_staged", "submission_failed"]);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_session_refuses_second_submit() {
        let service = Arc::new(ScriptedTaskService::new().accept_as("abc"));
        let session = session(service.clone(), Arc::new(RecordingEventSink::new()));
        session.stage(clip());
        let _ticket = session.submit().await.unwrap().unwrap();

        session.stage(PendingUpload::new(vec![1], "second.mp4"));
        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, SubmissionError::Busy));
        assert_eq!(session.staged_name().as_deref(), Some("second.mp4"));
        assert_eq!(service.uploads(), vec!["clip.mp4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_polling_freezes_the_store() {
        let service = Arc::new(
            ScriptedTaskService::new()
                .gated()
                .accept_as("abc")
                .script("abc", [Ok(StatusReport::completed().with_title("late"))]),
        );
        let session = session(service.clone(), Arc::new(RecordingEventSink::new()));
        session.stage(clip());
        let ticket = session.submit().await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(service.status_calls(), 1);

        session.teardown();
        service.release(1);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(ticket.outcome().await.is_none());
        assert!(session.current_artifacts().is_empty());
        assert!(session.is_torn_down());
        assert_eq!(session.snapshot().active_task, None);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_after_teardown_sends_nothing() {
        let service = Arc::new(ScriptedTaskService::new().accept_as("abc"));
        let events = Arc::new(RecordingEventSink::new());
        let session = session(service.clone(), events.clone());

        session.teardown();
        session.stage(clip());
        let err = session.submit().await.unwrap_err();

        assert!(matches!(err, SubmissionError::TornDown));
        assert!(service.uploads().is_empty());
        assert!(!session.is_processing());
        assert_eq!(session.staged_name().as_deref(), Some("clip.mp4"));
        assert!(matches!(session.submit().await, Err(SubmissionError::TornDown)));
        assert!(!events.names().contains(&"task_submitted"));
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_during_upload_clears_processing() {
        let service = Arc::new(ScriptedTaskService::new().hold_submits().accept_as("abc"));
        let events = Arc::new(RecordingEventSink::new());
        let session = Arc::new(session(service.clone(), events.clone()));
        session.stage(clip());

        let pending = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit().await.map(|ticket| ticket.is_some()) }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(session.is_processing());

        session.teardown();
        service.release_submits(1);
        let result = pending.await.unwrap();

        assert!(matches!(result, Err(SubmissionError::TornDown)));
        assert!(!session.is_processing());
        assert_eq!(service.uploads(), vec!["clip.mp4"]);
        assert!(!events.names().contains(&"task_submitted"));
        assert_eq!(session.poller_state(), PollerState::Idle);
        assert_eq!(session.snapshot().active_task, None);
    }

    #[tokio::test(start_paused = true)]
    async fn selection_does_not_touch_store() {
        let session = session(
            Arc::new(ScriptedTaskService::new()),
            Arc::new(RecordingEventSink::new()),
        );
        let artifact = session
            .send_query("a goal")
            .unwrap()
            .outcome()
            .await
            .unwrap()
            .artifact()
            .cloned()
            .unwrap();
        let before = session.current_artifacts();

        session.select(Some(artifact.clone()));
        assert_eq!(session.snapshot().playing.as_deref(), Some(artifact.title.as_str()));
        session.select(None);

        assert_eq!(session.current_artifacts(), before);
        assert!(!session.playback().is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_and_tasks_share_the_store() {
        let service = Arc::new(
            ScriptedTaskService::new()
                .accept_as("abc")
                .script("abc", [Ok(StatusReport::completed())]),
        );
        let session = session(service, Arc::new(RecordingEventSink::new()));

        let image = session.send_image(vec![1, 2, 3], "frame.png");
        image.outcome().await.unwrap();
        session.stage(clip());
        let outcome = session.submit().await.unwrap().unwrap().outcome().await.unwrap();

        assert_eq!(outcome.artifact().unwrap().title, "Processed Video 2");
        assert_eq!(session.snapshot().artifacts, 2);
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_discovery() {
        let store = Arc::new(crate::impls::InMemoryArtifactStore::new());
        let session = SessionBuilder::new(config())
            .task_service(Arc::new(ScriptedTaskService::new()))
            .artifact_store(store.clone())
            .decider(Arc::new(FixedDecider(true)))
            .build()
            .unwrap();

        let ticket = session.send_query("late").unwrap();
        drop(session);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(ticket.outcome().await.is_none());
        assert!(store.is_empty());
    }
}
