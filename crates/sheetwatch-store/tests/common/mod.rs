use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sheetwatch_store::FsSnapshotStore;
use tempfile::TempDir;

/// Store rooted in a fresh temp directory. Keep the `TempDir` alive.
#[allow(dead_code)]
pub fn temp_store() -> (TempDir, FsSnapshotStore) {
    let dir = TempDir::new().unwrap();
    let store = FsSnapshotStore::new(dir.path());
    (dir, store)
}

#[allow(dead_code)]
pub fn ts(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[allow(dead_code)]
pub fn sheet(level: u64, hp_max: u64) -> Value {
    json!({
        "character_info": {"name": "Vex", "level": level},
        "combat": {"hit_points": {"maximum": hp_max, "current": hp_max}}
    })
}
