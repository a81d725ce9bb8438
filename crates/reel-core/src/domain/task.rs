//! Remote task model: handle, status taxonomy, and status reports.
//!
//! The remote service speaks loosely-typed strings. Everything is parsed into
//! the closed [`TaskStatus`] taxonomy here, at the boundary, so the poller
//! only ever matches on an enum.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque task identifier issued by the processing service.
///
/// Exists only between a successful submission and the poller's resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Returns `None` for an empty (or whitespace-only) identifier.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a remote task.
///
/// `Unrecognized` keeps the raw value for diagnostics and is non-terminal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    NotFound,
    Unrecognized(String),
}

impl TaskStatus {
    /// Case-insensitive parse. Never fails.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "not_found" => Self::NotFound,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Terminal statuses end polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::NotFound)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::NotFound => "not_found",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a task's status.
///
/// Optional fields are only meaningful for `Completed`. Empty strings are
/// normalized to `None` so defaults apply uniformly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: TaskStatus,
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub title: Option<String>,
}

impl StatusReport {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            video_url: None,
            thumbnail_url: None,
            title: None,
        }
    }

    pub fn pending() -> Self {
        Self::new(TaskStatus::Pending)
    }

    pub fn in_progress() -> Self {
        Self::new(TaskStatus::InProgress)
    }

    pub fn completed() -> Self {
        Self::new(TaskStatus::Completed)
    }

    pub fn failed() -> Self {
        Self::new(TaskStatus::Failed)
    }

    pub fn not_found() -> Self {
        Self::new(TaskStatus::NotFound)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = non_empty(title.into());
        self
    }

    pub fn with_video_url(mut self, url: impl Into<String>) -> Self {
        self.video_url = non_empty(url.into());
        self
    }

    pub fn with_thumbnail_url(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = non_empty(url.into());
        self
    }
}

/// Wire shape of `GET /task-status/{taskId}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl From<StatusResponse> for StatusReport {
    fn from(wire: StatusResponse) -> Self {
        Self {
            status: TaskStatus::parse(&wire.status),
            video_url: wire.video_url.and_then(non_empty),
            thumbnail_url: wire.thumbnail_url.and_then(non_empty),
            title: wire.title.and_then(non_empty),
        }
    }
}

/// Wire shape of `POST /process-video`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pending", TaskStatus::Pending)]
    #[case("PENDING", TaskStatus::Pending)]
    #[case("In_Progress", TaskStatus::InProgress)]
    #[case(" completed ", TaskStatus::Completed)]
    #[case("Failed", TaskStatus::Failed)]
    #[case("NOT_FOUND", TaskStatus::NotFound)]
    #[case("queued", TaskStatus::Unrecognized("queued".to_string()))]
    fn status_parse_is_case_insensitive(#[case] raw: &str, #[case] expected: TaskStatus) {
        assert_eq!(TaskStatus::parse(raw), expected);
    }

    #[test]
    fn only_completed_failed_not_found_are_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::NotFound.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::InProgress.is_terminal());
        assert!(!TaskStatus::Unrecognized("weird".into()).is_terminal());
    }

    #[test]
    fn status_response_normalizes_empty_fields() {
        let wire: StatusResponse = serde_json::from_value(serde_json::json!({
            "task_id": "abc",
            "status": "COMPLETED",
            "videoUrl": "",
            "title": "Match highlights",
        }))
        .unwrap();

        let report = StatusReport::from(wire);
        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!(report.video_url, None);
        assert_eq!(report.thumbnail_url, None);
        assert_eq!(report.title.as_deref(), Some("Match highlights"));
    }

    #[test]
    fn empty_task_handle_is_rejected() {
        assert!(TaskHandle::new("").is_none());
        assert!(TaskHandle::new("   ").is_none());
        assert_eq!(TaskHandle::new("t-1").unwrap().as_str(), "t-1");
    }
}
