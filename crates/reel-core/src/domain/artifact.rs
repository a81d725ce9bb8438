//! Artifact model: a produced video in the local collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ArtifactId;
use super::task::TaskHandle;

/// Where an artifact came from.
///
/// Downstream consumers (store, playback) never branch on this; it is kept
/// for display and diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactOrigin {
    /// Produced by a remote processing task.
    Task { task_id: TaskHandle },

    /// Produced by a conversational discovery query.
    Query { query: String },

    /// Produced by an image similarity request.
    Image { file_name: String },
}

/// A produced video result.
///
/// Immutable after creation; the store only ever inserts whole artifacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: ArtifactId,
    pub title: String,
    /// Locator of the playable content. May be empty for a degraded result.
    pub media_url: String,
    /// Locator of the static preview image.
    pub preview_url: String,
    pub origin: ArtifactOrigin,
    pub created_at: DateTime<Utc>,
}

impl Artifact {
    /// True when the service completed without a media reference.
    pub fn is_degraded(&self) -> bool {
        self.media_url.is_empty()
    }
}

/// Title used when a completed task reports no title.
///
/// `position` is the 1-based ordinal of the new artifact (store size + 1).
pub fn ordinal_title(position: usize) -> String {
    format!("Processed Video {position}")
}
