//! DiscoveryTrigger - チャット / 画像から artifact を作る経路
//!
//! # 流れ
//! 1. user メッセージを即座に transcript に積む
//! 2. resolver に問い合わせ（SimulatedDiscovery なら固定レイテンシ）
//! 3. 動画が返れば store に append し、bot メッセージを積む
//!
//! リクエスト同士の排他はない。セッションの teardown で待機中のものは全て捨てる。
//! 結果の反映（store / transcript）と `shutdown` は同じロックの下で行うので、
//! shutdown が返った後に artifact が増えることはない。

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    Artifact, ArtifactOrigin, DiscoveryError, DiscoveryOutcome, DiscoveryReply, DiscoveryRequest,
    RequestId, SessionEvent,
};
use crate::ports::{ArtifactStore, Clock, DiscoveryResolver, EventSink, IdGenerator};

use super::transcript::Transcript;

pub const APOLOGY_MESSAGE: &str = "Sorry, I couldn't process that request. Please try again.";

/// Receives the outcome of one discovery request.
#[derive(Debug)]
pub struct DiscoveryTicket {
    request: RequestId,
    rx: oneshot::Receiver<DiscoveryOutcome>,
}

impl DiscoveryTicket {
    pub fn request(&self) -> RequestId {
        self.request
    }

    /// `None` when the session was torn down first.
    pub async fn outcome(self) -> Option<DiscoveryOutcome> {
        self.rx.await.ok()
    }
}

#[derive(Clone)]
pub struct DiscoveryTrigger {
    resolver: Arc<dyn DiscoveryResolver>,
    store: Arc<dyn ArtifactStore>,
    transcript: Arc<Transcript>,
    events: Arc<dyn EventSink>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
    commit: Arc<Mutex<()>>,
}

impl DiscoveryTrigger {
    pub(crate) fn new(
        resolver: Arc<dyn DiscoveryResolver>,
        store: Arc<dyn ArtifactStore>,
        transcript: Arc<Transcript>,
        events: Arc<dyn EventSink>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            store,
            transcript,
            events,
            ids,
            clock,
            cancel,
            commit: Arc::new(Mutex::new(())),
        }
    }

    /// Stops every pending request. Waits for a result that is being
    /// applied right now, so nothing is appended once this returns.
    pub(crate) fn shutdown(&self) {
        let _commit = self.commit.lock().unwrap_or_else(PoisonError::into_inner);
        self.cancel.cancel();
    }

    /// Blank text is ignored.
    pub fn send_query(&self, text: &str) -> Option<DiscoveryTicket> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.transcript.post_user(text, None);
        Some(self.dispatch(DiscoveryRequest::Query {
            id: self.ids.generate_request_id(),
            text: text.to_string(),
        }))
    }

    pub fn send_image(&self, bytes: Vec<u8>, file_name: &str) -> DiscoveryTicket {
        self.transcript
            .post_user(format!("Uploaded image: {file_name}"), Some(file_name.to_string()));
        self.dispatch(DiscoveryRequest::Image {
            id: self.ids.generate_request_id(),
            file_name: file_name.to_string(),
            bytes,
        })
    }

    fn dispatch(&self, request: DiscoveryRequest) -> DiscoveryTicket {
        let (reply, rx) = oneshot::channel();
        let ticket = DiscoveryTicket {
            request: request.id(),
            rx,
        };

        tracing::info!(request = %request.id(), kind = %request.kind(), "discovery requested");
        self.events.emit(SessionEvent::DiscoveryRequested {
            request: request.id(),
            kind: request.kind(),
        });

        let this = self.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = this.cancel.cancelled() => return,
                result = this.resolver.resolve(&request) => result,
            };
            if let Some(outcome) = this.apply(&request, result) {
                let _ = reply.send(outcome);
            }
        });

        ticket
    }

    /// `None` once the trigger is shut down; nothing is recorded then.
    fn apply(
        &self,
        request: &DiscoveryRequest,
        result: Result<DiscoveryReply, DiscoveryError>,
    ) -> Option<DiscoveryOutcome> {
        let _commit = self.commit.lock().unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            tracing::debug!(request = %request.id(), "discovery result dropped after shutdown");
            return None;
        }

        let id = request.id();
        let appended = result.and_then(|reply| match reply {
            DiscoveryReply::Video {
                title,
                media_url,
                preview_url,
                message,
            } => {
                let artifact = Artifact {
                    id: self.ids.generate_artifact_id(),
                    title,
                    media_url,
                    preview_url,
                    origin: origin_of(request),
                    created_at: self.clock.now(),
                };
                self.store.append(artifact.clone())?;
                Ok((Some(artifact), message))
            }
            DiscoveryReply::Answer { message } => Ok((None, message)),
        });

        match appended {
            Ok((artifact, message)) => {
                self.transcript.post_bot(message.clone());
                if let Some(artifact) = &artifact {
                    tracing::info!(request = %id, artifact = %artifact.id, title = %artifact.title, "discovery produced a video");
                    self.events.emit(SessionEvent::ArtifactAdded {
                        artifact: artifact.id,
                        title: artifact.title.clone(),
                    });
                }
                self.events.emit(SessionEvent::DiscoveryAnswered {
                    request: id,
                    artifact: artifact.as_ref().map(|a| a.id),
                });
                Some(match artifact {
                    Some(artifact) => DiscoveryOutcome::Video(artifact),
                    None => DiscoveryOutcome::Answer(message),
                })
            }
            Err(err) => {
                tracing::error!(request = %id, error = %err, "discovery failed");
                self.transcript.post_bot(APOLOGY_MESSAGE);
                self.events.emit(SessionEvent::DiscoveryFailed {
                    request: id,
                    error: err.to_string(),
                });
                Some(DiscoveryOutcome::Failed(err))
            }
        }
    }
}

fn origin_of(request: &DiscoveryRequest) -> ArtifactOrigin {
    match request {
        DiscoveryRequest::Query { text, .. } => ArtifactOrigin::Query {
            query: text.clone(),
        },
        DiscoveryRequest::Image { file_name, .. } => ArtifactOrigin::Image {
            file_name: file_name.clone(),
        },
    }
}
