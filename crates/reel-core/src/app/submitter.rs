//! UploadSubmitter - アップロードを送って task handle を受け取る
//!
//! リトライはしない。失敗したら呼び出し側（Session）が staged に戻す。

use std::sync::Arc;

use crate::domain::{PendingUpload, SubmissionError, TaskHandle};
use crate::ports::TaskService;

#[derive(Clone)]
pub struct UploadSubmitter {
    service: Arc<dyn TaskService>,
}

impl UploadSubmitter {
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self { service }
    }

    pub async fn submit(&self, upload: &PendingUpload) -> Result<TaskHandle, SubmissionError> {
        tracing::info!(
            file_name = upload.file_name(),
            bytes = upload.len(),
            content_type = upload.content_type(),
            "submitting upload"
        );

        match self.service.submit(upload).await {
            Ok(handle) => {
                tracing::info!(task = %handle, "upload accepted");
                Ok(handle)
            }
            Err(err) => {
                tracing::error!(file_name = upload.file_name(), error = %err, "upload failed");
                Err(SubmissionError::Service(err))
            }
        }
    }
}
