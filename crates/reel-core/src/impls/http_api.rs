//! HttpApi - リモート動画処理サービスの reqwest クライアント
//!
//! # エンドポイント
//! - `POST /process-video` (multipart `file`) → `{ "taskId" }`
//! - `GET /task-status/{taskId}` → `{ "status", "videoUrl"?, "thumbnailUrl"?, "title"? }`
//! - `POST /chat` → `{ "response" }`（テキスト問い合わせのみ）
//! - `POST /reset-memory` → `{ "message" }`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::domain::{
    DiscoveryError, DiscoveryReply, DiscoveryRequest, PendingUpload, ServiceError, StatusReport,
    StatusResponse, SubmitResponse, TaskHandle,
};
use crate::ports::{DiscoveryResolver, TaskService};

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    video_path: Option<&'a str>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct ResetResponse {
    #[serde(default)]
    message: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ServiceError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ServiceError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Clears the remote agent's conversation memory and returns its reply.
    pub async fn reset_memory(&self) -> Result<String, ServiceError> {
        let url = self.endpoint(&["reset-memory"])?;
        tracing::debug!(%url, "resetting remote memory");

        let response = self.client.post(url).send().await?;
        let body: ResetResponse = ensure_success(response).await?.json().await?;
        Ok(body.message)
    }

    /// Appends path segments to the base URL; each segment is percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn chat(&self, message: &str) -> Result<String, ServiceError> {
        let url = self.endpoint(&["chat"])?;
        let response = self
            .client
            .post(url)
            .json(&ChatRequest {
                message,
                video_path: None,
            })
            .send()
            .await?;
        let body: ChatResponse = ensure_success(response).await?.json().await?;
        Ok(body.response)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TaskService for HttpApi {
    async fn submit(&self, upload: &PendingUpload) -> Result<TaskHandle, ServiceError> {
        let url = self.endpoint(&["process-video"])?;
        let part = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(upload.content_type())?;
        let form = Form::new().part("file", part);

        tracing::debug!(%url, file_name = upload.file_name(), bytes = upload.len(), "uploading");
        let response = self.client.post(url).multipart(form).send().await?;
        let body: SubmitResponse = ensure_success(response).await?.json().await?;

        TaskHandle::new(body.task_id)
            .ok_or_else(|| ServiceError::Malformed("response carried an empty taskId".to_string()))
    }

    async fn status(&self, task: &TaskHandle) -> Result<StatusReport, ServiceError> {
        let url = self.endpoint(&["task-status", task.as_str()])?;
        let response = self.client.get(url).send().await?;
        let body: StatusResponse = ensure_success(response).await?.json().await?;
        Ok(body.into())
    }
}

#[async_trait]
impl DiscoveryResolver for HttpApi {
    async fn resolve(&self, request: &DiscoveryRequest) -> Result<DiscoveryReply, DiscoveryError> {
        match request {
            DiscoveryRequest::Query { text, .. } => {
                let message = self.chat(text).await?;
                Ok(DiscoveryReply::Answer { message })
            }
            DiscoveryRequest::Image { .. } => Err(DiscoveryError::Unsupported("image")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RequestId;
    use rstest::rstest;
    use ulid::Ulid;

    fn api(base: &str) -> HttpApi {
        HttpApi::new(base, Duration::from_secs(5)).unwrap()
    }

    #[rstest]
    #[case("http://localhost:8080", "http://localhost:8080/task-status/abc")]
    #[case("http://localhost:8080/", "http://localhost:8080/task-status/abc")]
    #[case("https://api.test/v1/", "https://api.test/v1/task-status/abc")]
    fn endpoint_appends_segments(#[case] base: &str, #[case] expected: &str) {
        let url = api(base).endpoint(&["task-status", "abc"]).unwrap();
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn task_id_is_percent_encoded() {
        let url = api("http://localhost:8080")
            .endpoint(&["task-status", "a/b c"])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/task-status/a%2Fb%20c");
    }

    #[rstest]
    #[case("not a url")]
    #[case("mailto:someone@example.test")]
    fn rejects_unusable_base_url(#[case] base: &str) {
        let err = HttpApi::new(base, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidUrl(_)));
    }

    #[test]
    fn chat_request_sends_null_video_path() {
        let body = serde_json::to_value(ChatRequest {
            message: "hi",
            video_path: None,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "message": "hi", "video_path": null }));
    }

    #[tokio::test]
    async fn image_discovery_is_unsupported() {
        let request = DiscoveryRequest::Image {
            id: RequestId::from_ulid(Ulid::new()),
            file_name: "cat.png".to_string(),
            bytes: vec![1, 2, 3],
        };

        let err = api("http://localhost:8080").resolve(&request).await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Unsupported("image")));
    }
}
