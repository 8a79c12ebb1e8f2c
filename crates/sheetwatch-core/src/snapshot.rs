//! Snapshot persistence seam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Result;

/// On-disk format version written by this crate.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A persisted character snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub format_version: u32,
    pub character_id: String,
    pub captured_at: DateTime<Utc>,
    /// `sha256:<hex>` of the canonical JSON of `data`.
    pub digest: String,
    pub data: Value,
}

/// Where the previous snapshot of each character lives.
pub trait SnapshotStore: Send + Sync {
    /// Latest snapshot for `character_id`, if any.
    ///
    /// # Errors
    ///
    /// `PERSISTENCE_ERROR` for unreadable or unsupported stored data.
    fn load_latest(&self, character_id: &str) -> Result<Option<StoredSnapshot>>;

    /// Persist `data` as the latest snapshot.
    ///
    /// # Errors
    ///
    /// `PERSISTENCE_ERROR` / `IO_ERROR` when the write fails.
    fn save(
        &self,
        character_id: &str,
        data: &Value,
        captured_at: DateTime<Utc>,
    ) -> Result<StoredSnapshot>;
}
