//! Discovery model: requests, replies, and outcomes of the chat-driven path.
//!
//! Discovery produces the same [`Artifact`] as the task poller, just through a
//! different trigger. Nothing downstream needs to know which one it was.

use std::fmt;

use super::artifact::Artifact;
use super::errors::DiscoveryError;
use super::ids::RequestId;

/// What the user sent.
#[derive(Clone, PartialEq, Eq)]
pub enum DiscoveryRequest {
    Query { id: RequestId, text: String },
    Image { id: RequestId, file_name: String, bytes: Vec<u8> },
}

impl DiscoveryRequest {
    pub fn id(&self) -> RequestId {
        match self {
            Self::Query { id, .. } | Self::Image { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> DiscoveryKind {
        match self {
            Self::Query { .. } => DiscoveryKind::Query,
            Self::Image { .. } => DiscoveryKind::Image,
        }
    }
}

impl fmt::Debug for DiscoveryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query { id, text } => f
                .debug_struct("Query")
                .field("id", id)
                .field("text", text)
                .finish(),
            Self::Image {
                id,
                file_name,
                bytes,
            } => f
                .debug_struct("Image")
                .field("id", id)
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiscoveryKind {
    Query,
    Image,
}

impl fmt::Display for DiscoveryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// What a resolver answered with.
///
/// `Video` carries the pieces of an artifact; the trigger assigns the id and
/// origin when it appends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryReply {
    Video {
        title: String,
        media_url: String,
        preview_url: String,
        message: String,
    },
    Answer {
        message: String,
    },
}

/// Final result of one discovery request.
#[derive(Debug, Clone)]
pub enum DiscoveryOutcome {
    Video(Artifact),
    Answer(String),
    Failed(DiscoveryError),
}

impl DiscoveryOutcome {
    pub fn artifact(&self) -> Option<&Artifact> {
        match self {
            Self::Video(artifact) => Some(artifact),
            _ => None,
        }
    }
}
