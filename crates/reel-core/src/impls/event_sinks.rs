//! EventSink implementations.

use std::sync::{Mutex, PoisonError};

use crate::domain::SessionEvent;
use crate::ports::EventSink;

/// Forwards every event to `tracing`, picking the level by severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: SessionEvent) {
        let name = event.name();
        match &event {
            SessionEvent::SubmissionFailed { file_name, error } => {
                tracing::error!(event = name, file_name = %file_name, error = %error, "upload was not accepted");
            }
            SessionEvent::TaskFailed { task, error } => {
                tracing::error!(event = name, task = %task, error = %error, "task abandoned");
            }
            SessionEvent::DiscoveryFailed { request, error } => {
                tracing::error!(event = name, request = %request, error = %error, "discovery failed");
            }
            SessionEvent::UnknownStatus { task, status } => {
                tracing::warn!(event = name, task = %task, status = %status, "unrecognized task status, still polling");
            }
            SessionEvent::DegradedResult { task, missing } => {
                tracing::warn!(event = name, task = %task, missing = ?missing, "completed task is missing fields, using defaults");
            }
            SessionEvent::PollerTransition { task, from, to } => {
                tracing::debug!(event = name, task = %task, from = %from, to = %to, "poller transition");
            }
            SessionEvent::TaskSubmitted { task } => {
                tracing::info!(event = name, task = %task, "task submitted");
            }
            SessionEvent::ArtifactAdded { artifact, title } => {
                tracing::info!(event = name, artifact = %artifact, title = %title, "artifact added");
            }
            other => {
                tracing::debug!(event = name, details = ?other);
            }
        }
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: SessionEvent) {}
}

/// Keeps every event in memory (tests, CLI summaries).
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Names of the recorded events, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(SessionEvent::name)
            .collect()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: SessionEvent) {
        tracing::trace!(event = event.name(), "recorded");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
