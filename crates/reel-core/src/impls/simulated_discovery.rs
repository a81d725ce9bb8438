//! SimulatedDiscovery - 固定レイテンシで結果を合成する discovery resolver
//!
//! # 振る舞い
//! - latency だけ待ってから応答（tokio time なので paused テストで進められる）
//! - query: Decider が true なら動画、false ならテキストだけ
//! - image: 常に動画

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::DiscoveryConfig;
use crate::domain::{DiscoveryError, DiscoveryReply, DiscoveryRequest};
use crate::ports::{Clock, Decider, DiscoveryResolver, ProbabilisticDecider, SystemClock};

pub const QUERY_VIDEO_MESSAGE: &str =
    "I've generated a video based on your query. You can see it in the Video Hub.";
pub const IMAGE_VIDEO_MESSAGE: &str = "Here is a video that I found based on your image.";

pub fn echo_message(query: &str) -> String {
    format!(
        "I've received your message: \"{query}\". I am a mock AI. In a real app, I'd provide a helpful answer."
    )
}

pub struct SimulatedDiscovery {
    latency: Duration,
    decider: Arc<dyn Decider>,
    clock: Arc<dyn Clock>,
    media_url: String,
    preview_base: String,
}

impl SimulatedDiscovery {
    pub fn new(config: &DiscoveryConfig) -> Self {
        Self {
            latency: config.latency,
            decider: Arc::new(ProbabilisticDecider::new(config.video_probability)),
            clock: Arc::new(SystemClock),
            media_url: config.sample_media_url.clone(),
            preview_base: config.preview_base_url.clone(),
        }
    }

    pub fn with_decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = decider;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }

    fn video(&self, title: String, message: &str) -> DiscoveryReply {
        DiscoveryReply::Video {
            title,
            media_url: self.media_url.clone(),
            // sig only has to differ between requests so previews are not cached
            preview_url: format!(
                "{}?sig={}",
                self.preview_base,
                self.clock.now().timestamp_millis()
            ),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Debug for SimulatedDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDiscovery")
            .field("latency", &self.latency)
            .field("media_url", &self.media_url)
            .field("preview_base", &self.preview_base)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DiscoveryResolver for SimulatedDiscovery {
    async fn resolve(&self, request: &DiscoveryRequest) -> Result<DiscoveryReply, DiscoveryError> {
        tokio::time::sleep(self.latency).await;

        let reply = match request {
            DiscoveryRequest::Query { text, .. } if self.decider.returns_video(text) => {
                self.video(format!("AI Result for: \"{text}\""), QUERY_VIDEO_MESSAGE)
            }
            DiscoveryRequest::Query { text, .. } => DiscoveryReply::Answer {
                message: echo_message(text),
            },
            DiscoveryRequest::Image { file_name, .. } => {
                self.video(format!("Similar to: {file_name}"), IMAGE_VIDEO_MESSAGE)
            }
        };
        Ok(reply)
    }
}
