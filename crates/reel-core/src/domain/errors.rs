//! Errors - エラー型と分類
//!
//! # 方針
//! - すべての失敗は component 境界で吸収し、quiescent な状態（Idle, processing flag off）
//!   + 診断イベントに変換する
//! - presentation 層に panic として漏らさない
//! - artifact が追加されないことで成功と区別できる

use std::sync::Arc;

use thiserror::Error;

/// ErrorKind は失敗の分類
///
/// - Submission: upload が受理されなかった（再送で回復可能）
/// - Polling: status 取得失敗 / failed / not_found / timeout（task は破棄、再 upload で回復）
/// - MalformedResponse: 想定外のレスポンス形状
/// - Discovery: discovery resolver の失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Submission,
    Polling,
    MalformedResponse,
    Discovery,
}

/// Failure talking to the remote service.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    #[error("service rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(Arc::new(err))
        }
    }
}

/// Why a submission produced no task handle.
#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("a task is already being processed")]
    Busy,

    #[error("session has been torn down")]
    TornDown,

    #[error("upload rejected: {0}")]
    Service(#[from] ServiceError),
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Submission
    }
}

/// Why an active task was abandoned.
#[derive(Debug, Clone, Error)]
pub enum PollingError {
    #[error("status query failed: {0}")]
    Query(#[from] ServiceError),

    #[error("remote processing failed")]
    Failed,

    #[error("task not found")]
    NotFound,

    #[error("gave up after {attempts} status queries")]
    TimedOut { attempts: u32 },

    #[error("result could not be stored: {0}")]
    Store(#[from] StoreError),
}

impl PollingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(ServiceError::Malformed(_)) => ErrorKind::MalformedResponse,
            _ => ErrorKind::Polling,
        }
    }
}

/// Why a discovery request produced nothing.
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Service(#[from] ServiceError),

    #[error("{0} discovery is not supported by this resolver")]
    Unsupported(&'static str),

    #[error("result could not be stored: {0}")]
    Store(#[from] StoreError),
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Discovery
    }
}

/// Store invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("artifact id already present: {0}")]
    DuplicateId(String),
}
