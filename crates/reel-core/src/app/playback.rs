//! PlaybackSelector - 再生中の artifact（0 or 1 件）
//!
//! artifact は値で保持するだけ。store には触らない。

use std::sync::{Mutex, PoisonError};

use crate::domain::Artifact;

#[derive(Debug, Default)]
pub struct PlaybackSelector {
    current: Mutex<Option<Artifact>>,
}

impl PlaybackSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` closes the player.
    pub fn select(&self, artifact: Option<Artifact>) {
        if let Some(artifact) = &artifact {
            tracing::debug!(artifact = %artifact.id, title = %artifact.title, "playback selected");
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = artifact;
    }

    pub fn close(&self) {
        self.select(None);
    }

    pub fn selected(&self) -> Option<Artifact> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_open(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
