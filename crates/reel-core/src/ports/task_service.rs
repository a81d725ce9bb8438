//! TaskService port - リモート処理サービスへの最小 HTTP 契約
//!
//! - `POST /process-video`（multipart `file`）→ `{ taskId }`
//! - `GET /task-status/{taskId}` → `{ status, videoUrl?, thumbnailUrl?, title? }`
//!
//! サービス内部のパイプラインはブラックボックス。

use async_trait::async_trait;

use crate::domain::{PendingUpload, ServiceError, StatusReport, TaskHandle};

/// TaskService はタスクの投入と状態取得を提供
///
/// # 実装
/// - HttpApi（本番用）
/// - ScriptedTaskService（テスト用）
#[async_trait]
pub trait TaskService: Send + Sync {
    /// upload を投入し、サービスが発行した handle を返す（リトライしない）
    async fn submit(&self, upload: &PendingUpload) -> Result<TaskHandle, ServiceError>;

    /// 現在のステータスを 1 回だけ問い合わせる
    async fn status(&self, task: &TaskHandle) -> Result<StatusReport, ServiceError>;
}
