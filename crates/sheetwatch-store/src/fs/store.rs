//! Filesystem snapshot store
//!
//! Layout:
//! ```text
//! <root>/<character_id>/latest.json
//! <root>/<character_id>/history/<captured_at>.json
//! ```
//! Saving moves the previous `latest.json` into `history/` when its digest
//! differs, then prunes history to the configured limit (oldest first).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use sheetwatch_core::snapshot::{SnapshotStore, StoredSnapshot, SNAPSHOT_FORMAT_VERSION};
use sheetwatch_core::{log_op_end, log_op_start};

use crate::digest::snapshot_digest;
use crate::errors::{corrupt_snapshot, invalid_character_id, io_error, unsupported_version, Result};
use crate::fs::atomic::atomic_write;

const LATEST_FILE: &str = "latest.json";
const HISTORY_DIR: &str = "history";
const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    root: PathBuf,
    history_limit: usize,
}

impl FsSnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Number of superseded snapshots kept per character. Zero disables history.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn character_dir(&self, character_id: &str) -> Result<PathBuf> {
        let valid = !character_id.is_empty()
            && character_id != "."
            && character_id != ".."
            && character_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(invalid_character_id(character_id));
        }
        Ok(self.root.join(character_id))
    }

    /// Superseded snapshots, newest first.
    ///
    /// # Errors
    ///
    /// `IO_ERROR` when the history directory cannot be listed, and
    /// `PERSISTENCE_ERROR` for an unreadable entry.
    pub fn history(&self, character_id: &str) -> Result<Vec<StoredSnapshot>> {
        let dir = self.character_dir(character_id)?.join(HISTORY_DIR);
        let mut files = history_files(&dir)?;
        files.reverse();
        files
            .iter()
            .map(|path| read_snapshot(path, character_id))
            .collect()
    }

    fn archive(&self, dir: &Path, previous: &StoredSnapshot) -> Result<()> {
        if self.history_limit == 0 {
            return Ok(());
        }
        let history = dir.join(HISTORY_DIR);
        let name = format!(
            "{}.json",
            previous.captured_at.format("%Y%m%dT%H%M%S%.3fZ")
        );
        let bytes = serde_json::to_vec_pretty(previous)?;
        atomic_write(&history.join(name), &bytes)?;

        let files = history_files(&history)?;
        let excess = files.len().saturating_sub(self.history_limit);
        for path in files.iter().take(excess) {
            fs::remove_file(path).map_err(|e| io_error("prune_snapshot_history", e))?;
        }
        Ok(())
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load_latest(&self, character_id: &str) -> Result<Option<StoredSnapshot>> {
        let path = self.character_dir(character_id)?.join(LATEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_snapshot(&path, character_id).map(Some)
    }

    fn save(
        &self,
        character_id: &str,
        data: &Value,
        captured_at: DateTime<Utc>,
    ) -> Result<StoredSnapshot> {
        log_op_start!("snapshot_save", character_id = character_id);
        let start = std::time::Instant::now();

        let dir = self.character_dir(character_id)?;
        let snapshot = StoredSnapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            character_id: character_id.to_string(),
            captured_at,
            digest: snapshot_digest(data),
            data: data.clone(),
        };

        // An unreadable previous file is overwritten rather than archived.
        if let Ok(Some(previous)) = self.load_latest(character_id) {
            if previous.digest != snapshot.digest {
                self.archive(&dir, &previous)?;
            }
        }

        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        atomic_write(&dir.join(LATEST_FILE), &bytes)?;

        log_op_end!(
            "snapshot_save",
            duration_ms = start.elapsed().as_millis() as u64,
            character_id = character_id
        );
        Ok(snapshot)
    }
}

fn read_snapshot(path: &Path, character_id: &str) -> Result<StoredSnapshot> {
    let bytes = fs::read(path).map_err(|e| io_error("read_snapshot", e))?;
    let raw: Value =
        serde_json::from_slice(&bytes).map_err(|e| corrupt_snapshot(character_id, &e.to_string()))?;

    let version = raw
        .get("format_version")
        .and_then(Value::as_u64)
        .ok_or_else(|| corrupt_snapshot(character_id, "missing format_version"))?;
    if version != u64::from(SNAPSHOT_FORMAT_VERSION) {
        return Err(unsupported_version(
            character_id,
            u32::try_from(version).unwrap_or(u32::MAX),
        ));
    }

    serde_json::from_value(raw).map_err(|e| corrupt_snapshot(character_id, &e.to_string()))
}

/// History files sorted oldest first. Names sort chronologically.
fn history_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| io_error("list_snapshot_history", e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use sheetwatch_core::errors::SwErrorKind;
    use tempfile::TempDir;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_780_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_missing_character_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        assert!(store.load_latest("char-1").unwrap().is_none());
    }

    #[test]
    fn test_path_traversal_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        for bad in ["", "..", "a/b", "../etc"] {
            let err = store.load_latest(bad).unwrap_err();
            assert_eq!(err.kind(), SwErrorKind::ValidationError, "id {bad:?}");
        }
    }

    #[test]
    fn test_unchanged_digest_is_not_archived() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path());
        store.save("c1", &json!({"a": 1}), at(0)).unwrap();
        store.save("c1", &json!({"a": 1}), at(60)).unwrap();
        assert!(store.history("c1").unwrap().is_empty());
    }

    #[test]
    fn test_history_is_bounded() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsSnapshotStore::new(temp_dir.path()).with_history_limit(2);
        for i in 0..5 {
            store.save("c1", &json!({"hp": i}), at(i * 60)).unwrap();
        }
        let history = store.history("c1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].data, json!({"hp": 3}));
        assert_eq!(history[1].data, json!({"hp": 2}));
    }
}
