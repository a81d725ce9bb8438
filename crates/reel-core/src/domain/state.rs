//! State - task poller の状態
//!
//! # 状態遷移
//! - Idle --submit success--> Submitted
//! - Submitted/Polling --pending|in_progress|unrecognized--> Polling
//! - Submitted/Polling --completed--> ResolvedSuccess
//! - Submitted/Polling --failed|not_found|query error|timeout--> ResolvedFailure
//! - Resolved* --> Idle（timer 停止・handle 破棄・processing flag クリア）

use std::fmt;

use serde::{Deserialize, Serialize};

/// PollerState は active task handle のライフサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerState {
    /// active handle なし
    Idle,
    /// handle 発行済み、最初の poll はまだ返っていない
    Submitted,
    /// 非終端ステータスを観測済み
    Polling,
    /// completed を観測（artifact を 1 件追加）
    ResolvedSuccess,
    /// failed / not_found / query error / timeout
    ResolvedFailure,
}

impl PollerState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::ResolvedSuccess | Self::ResolvedFailure)
    }

    /// handle を保持している状態か
    pub fn is_active(self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }
}

impl fmt::Display for PollerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Submitted => "submitted",
            Self::Polling => "polling",
            Self::ResolvedSuccess => "resolved_success",
            Self::ResolvedFailure => "resolved_failure",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_active_are_disjoint() {
        for state in [
            PollerState::Idle,
            PollerState::Submitted,
            PollerState::Polling,
            PollerState::ResolvedSuccess,
            PollerState::ResolvedFailure,
        ] {
            assert!(!(state.is_terminal() && state.is_active()), "{state}");
        }
        assert!(!PollerState::Idle.is_active());
        assert!(!PollerState::Idle.is_terminal());
    }
}
