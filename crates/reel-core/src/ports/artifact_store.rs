//! ArtifactStore port - 生成された動画のコレクション
//!
//! poller（成功時）と discovery の両方から書き込まれる唯一の共有リソース。
//!
//! # 設計原則
//! - append only（update / delete はない）
//! - 新しいものが先頭
//! - id の一意性のみ保証（title の重複は許す）
//! - 並行 append で更新が失われない

use crate::domain::{Artifact, ArtifactId, StoreError};

/// ArtifactStore は artifact の append-only コレクション
pub trait ArtifactStore: Send + Sync {
    /// 先頭に追加する。id が既に存在すれば `StoreError::DuplicateId`
    fn append(&self, artifact: Artifact) -> Result<(), StoreError>;

    /// 現在の件数を見て artifact を組み立て、同じロックの中で追加する
    ///
    /// `build` は追加前の件数を受け取る（ordinal なデフォルト title 用）
    fn append_with(
        &self,
        build: &mut dyn FnMut(usize) -> Artifact,
    ) -> Result<Artifact, StoreError>;

    /// 新しい順のスナップショット
    fn list(&self) -> Vec<Artifact>;

    fn get(&self, id: &ArtifactId) -> Option<Artifact>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
