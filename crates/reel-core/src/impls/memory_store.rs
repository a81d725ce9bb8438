//! InMemoryArtifactStore - セッション中だけ生きる artifact store
//!
//! # 実装詳細
//! - VecDeque に push_front（O(1)）で新しい順を保つ
//! - HashSet<ArtifactId> で id の一意性を O(1) で確認
//! - std Mutex で排他（ロック中に await しない）

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{Artifact, ArtifactId, StoreError};
use crate::ports::ArtifactStore;

#[derive(Default)]
struct StoreState {
    items: VecDeque<Artifact>,
    ids: HashSet<ArtifactId>,
}

impl StoreState {
    fn insert(&mut self, artifact: Artifact) -> Result<(), StoreError> {
        if !self.ids.insert(artifact.id) {
            return Err(StoreError::DuplicateId(artifact.id.to_string()));
        }
        self.items.push_front(artifact);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryArtifactStore {
    state: Mutex<StoreState>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the state half-written:
    // both collections are updated after the only fallible check.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn append(&self, artifact: Artifact) -> Result<(), StoreError> {
        self.lock().insert(artifact)
    }

    fn append_with(
        &self,
        build: &mut dyn FnMut(usize) -> Artifact,
    ) -> Result<Artifact, StoreError> {
        let mut state = self.lock();
        let artifact = build(state.items.len());
        state.insert(artifact.clone())?;
        Ok(artifact)
    }

    fn list(&self) -> Vec<Artifact> {
        self.lock().items.iter().cloned().collect()
    }

    fn get(&self, id: &ArtifactId) -> Option<Artifact> {
        self.lock().items.iter().find(|a| a.id == *id).cloned()
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }
}

impl std::fmt::Debug for InMemoryArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryArtifactStore")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArtifactOrigin, ordinal_title};
    use chrono::Utc;
    use std::sync::Arc;
    use ulid::Ulid;

    fn artifact(title: &str) -> Artifact {
        Artifact {
            id: ArtifactId::from_ulid(Ulid::new()),
            title: title.to_string(),
            media_url: "https://example.test/v.mp4".to_string(),
            preview_url: "https://example.test/p.jpg".to_string(),
            origin: ArtifactOrigin::Query {
                query: title.to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn newest_first() {
        let store = InMemoryArtifactStore::new();
        store.append(artifact("a")).unwrap();
        store.append(artifact("b")).unwrap();
        store.append(artifact("c")).unwrap();

        let titles: Vec<_> = store.list().into_iter().map(|a| a.title).collect();
        assert_eq!(titles, vec!["c", "b", "a"]);
    }

    #[test]
    fn duplicate_id_is_rejected_but_duplicate_title_is_not() {
        let store = InMemoryArtifactStore::new();
        let first = artifact("same");
        store.append(first.clone()).unwrap();

        let err = store.append(first.clone()).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(first.id.to_string()));
        assert_eq!(store.len(), 1);

        store.append(artifact("same")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn list_is_idempotent_without_append() {
        let store = InMemoryArtifactStore::new();
        store.append(artifact("a")).unwrap();
        store.append(artifact("b")).unwrap();

        assert_eq!(store.list(), store.list());
    }

    #[test]
    fn append_with_sees_count_before_insert() {
        let store = InMemoryArtifactStore::new();
        store.append(artifact("a")).unwrap();

        let added = store
            .append_with(&mut |count| artifact(&ordinal_title(count + 1)))
            .unwrap();

        assert_eq!(added.title, "Processed Video 2");
        assert_eq!(store.get(&added.id), Some(added));
    }

    #[test]
    fn concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryArtifactStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append(artifact(&format!("{t}-{i}"))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
        let ids: HashSet<_> = store.list().into_iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 400);
    }
}
