//! IdGenerator port - ID 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock から timestamp を取る）

use crate::domain::ids::{ArtifactId, MessageId, RequestId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator はクライアント側の ID を生成
///
/// `Send + Sync` を要求（discovery の timer task からも呼ばれる）
pub trait IdGenerator: Send + Sync {
    fn generate_artifact_id(&self) -> ArtifactId;

    fn generate_message_id(&self) -> MessageId;

    fn generate_request_id(&self) -> RequestId;
}

/// UlidGenerator は ULID ベースの ID 生成器
///
/// FixedClock を渡すと timestamp 部分が固定される（ランダム部分は残る）
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis().max(0) as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_artifact_id(&self) -> ArtifactId {
        ArtifactId::from(self.next())
    }

    fn generate_message_id(&self) -> MessageId {
        MessageId::from(self.next())
    }

    fn generate_request_id(&self) -> RequestId {
        RequestId::from(self.next())
    }
}
