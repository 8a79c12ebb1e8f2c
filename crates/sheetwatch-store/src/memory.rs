//! In-memory snapshot store

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sheetwatch_core::snapshot::{SnapshotStore, StoredSnapshot, SNAPSHOT_FORMAT_VERSION};

use crate::digest::snapshot_digest;
use crate::errors::Result;

/// Keeps only the latest snapshot per character. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    latest: Mutex<HashMap<String, StoredSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredSnapshot>> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load_latest(&self, character_id: &str) -> Result<Option<StoredSnapshot>> {
        Ok(self.lock().get(character_id).cloned())
    }

    fn save(
        &self,
        character_id: &str,
        data: &Value,
        captured_at: DateTime<Utc>,
    ) -> Result<StoredSnapshot> {
        let snapshot = StoredSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            character_id: character_id.to_string(),
            captured_at,
            digest: snapshot_digest(data),
            data: data.clone(),
        };
        self.lock()
            .insert(character_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }
}
