//! Version history records produced by the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable descriptor of one collection snapshot in history.
///
/// Records are append-only: the store creates them on every mutation and the
/// editor only reads them to drive a restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version_id: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub email: String,
    pub message: String,
    pub parent_ids: Vec<String>,
}

impl VersionRecord {
    /// Short (8 character) form of the version id for list rendering.
    pub fn short_id(&self) -> &str {
        let end = self
            .version_id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.version_id.len());
        &self.version_id[..end]
    }
}
