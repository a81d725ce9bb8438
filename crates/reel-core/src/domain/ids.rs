//! Local identifiers (strongly-typed IDs).
//!
//! Artifact / Message / DiscoveryRequest の ID はクライアント側で生成します。
//! リモートサービスが発行する task id は [`TaskHandle`](super::TaskHandle) で、
//! ここでは扱いません。
//!
//! ## ULID + Phantom Type
//! - `Id<T>` で共通実装を提供し、`T` はマーカー型（実行時コストなし）
//! - ULID なので生成順にソート可能
//! - `ArtifactId` と `MessageId` はコンパイル時に混同できない

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"artifact-", "msg-", ...）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

// ========================================
// マーカー型
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {}

impl IdMarker for Artifact {
    fn prefix() -> &'static str {
        "artifact-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Message {}

impl IdMarker for Message {
    fn prefix() -> &'static str {
        "msg-"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Discovery {}

impl IdMarker for Discovery {
    fn prefix() -> &'static str {
        "discovery-"
    }
}

/// Identifier of an artifact in the store.
pub type ArtifactId = Id<Artifact>;

/// Identifier of a transcript message.
pub type MessageId = Id<Message>;

/// Identifier of one discovery request (query or image).
pub type RequestId = Id<Discovery>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_marker_prefix() {
        let ulid = Ulid::new();

        let artifact = ArtifactId::from_ulid(ulid);
        let message = MessageId::from_ulid(ulid);
        let request = RequestId::from_ulid(ulid);

        assert_eq!(artifact.as_ulid(), ulid);
        assert!(artifact.to_string().starts_with("artifact-"));
        assert!(message.to_string().starts_with("msg-"));
        assert!(request.to_string().starts_with("discovery-"));
    }

    #[test]
    fn serializes_as_bare_ulid() {
        let id = ArtifactId::from_ulid(Ulid::new());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));

        let back: ArtifactId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;

        assert_eq!(size_of::<ArtifactId>(), size_of::<Ulid>());
        assert_eq!(size_of::<RequestId>(), 16);
    }
}
