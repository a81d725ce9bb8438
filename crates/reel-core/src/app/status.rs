//! Status - セッションの現在状態のスナップショット
//!
//! CLI の表示やログ出力用。値は取得時点のもので、以降は更新されない。

use serde::Serialize;

use crate::domain::{PollerState, TaskHandle};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub artifacts: usize,
    pub messages: usize,
    pub processing: bool,
    pub poller_state: PollerState,
    pub active_task: Option<TaskHandle>,
    pub staged: Option<String>,
    pub playing: Option<String>,
}

impl SessionSnapshot {
    /// One line for terminal output.
    pub fn summary(&self) -> String {
        let task = self
            .active_task
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        format!(
            "artifacts={} messages={} processing={} poller={} task={}",
            self.artifacts, self.messages, self.processing, self.poller_state, task
        )
    }
}
