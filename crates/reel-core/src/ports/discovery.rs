//! DiscoveryResolver port - discovery request に答える
//!
//! # 実装
//! - SimulatedDiscovery: 固定レイテンシ後に結果を合成（Decider で分岐）
//! - HttpApi: `POST /chat` に問い合わせる（テキスト回答のみ）

use async_trait::async_trait;

use crate::domain::{DiscoveryError, DiscoveryReply, DiscoveryRequest};

#[async_trait]
pub trait DiscoveryResolver: Send + Sync {
    async fn resolve(&self, request: &DiscoveryRequest) -> Result<DiscoveryReply, DiscoveryError>;
}
