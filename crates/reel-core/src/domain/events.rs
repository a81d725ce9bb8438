//! Events - セッションで発生した診断イベント
//!
//! EventSink へ送られる。presentation 層への「診断シグナル」であり、
//! エラーを例外として伝播させない代わりにここで報告する。

use super::discovery::DiscoveryKind;
use super::ids::{ArtifactId, RequestId};
use super::state::PollerState;
use super::task::{TaskHandle, TaskStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UploadStaged {
        file_name: String,
        bytes: usize,
    },
    UploadDiscarded {
        file_name: String,
    },
    TaskSubmitted {
        task: TaskHandle,
    },
    SubmissionFailed {
        file_name: String,
        error: String,
    },
    /// Every poller transition, including self-loops on `Polling`.
    PollerTransition {
        task: TaskHandle,
        from: PollerState,
        to: PollerState,
    },
    /// The service answered with a status outside the known taxonomy.
    UnknownStatus {
        task: TaskHandle,
        status: TaskStatus,
    },
    /// A completed task was missing fields and defaults were applied.
    DegradedResult {
        task: TaskHandle,
        missing: Vec<&'static str>,
    },
    ArtifactAdded {
        artifact: ArtifactId,
        title: String,
    },
    TaskFailed {
        task: TaskHandle,
        error: String,
    },
    DiscoveryRequested {
        request: RequestId,
        kind: DiscoveryKind,
    },
    DiscoveryAnswered {
        request: RequestId,
        artifact: Option<ArtifactId>,
    },
    DiscoveryFailed {
        request: RequestId,
        error: String,
    },
}

impl SessionEvent {
    /// Short stable name, used as the `event` field in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UploadStaged { .. } => "upload_staged",
            Self::UploadDiscarded { .. } => "upload_discarded",
            Self::TaskSubmitted { .. } => "task_submitted",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::PollerTransition { .. } => "poller_transition",
            Self::UnknownStatus { .. } => "unknown_status",
            Self::DegradedResult { .. } => "degraded_result",
            Self::ArtifactAdded { .. } => "artifact_added",
            Self::TaskFailed { .. } => "task_failed",
            Self::DiscoveryRequested { .. } => "discovery_requested",
            Self::DiscoveryAnswered { .. } => "discovery_answered",
            Self::DiscoveryFailed { .. } => "discovery_failed",
        }
    }
}
