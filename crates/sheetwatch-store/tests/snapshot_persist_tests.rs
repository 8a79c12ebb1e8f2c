mod common;

use std::fs;

use serde_json::json;
use sheetwatch_core::errors::SwErrorKind;
use sheetwatch_core::snapshot::{SnapshotStore, SNAPSHOT_FORMAT_VERSION};
use sheetwatch_store::{snapshot_digest, MemorySnapshotStore};

use common::{sheet, temp_store, ts};

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn test_save_then_load_returns_same_snapshot() {
    let (_dir, store) = temp_store();
    let data = sheet(4, 27);

    let saved = store
        .save("char-1001", &data, ts("2026-05-01T18:30:00Z"))
        .unwrap();
    let loaded = store.load_latest("char-1001").unwrap().unwrap();

    assert_eq!(saved, loaded);
    assert_eq!(loaded.format_version, SNAPSHOT_FORMAT_VERSION);
    assert_eq!(loaded.digest, snapshot_digest(&data));
    assert_eq!(loaded.captured_at, ts("2026-05-01T18:30:00Z"));
}

#[test]
fn test_characters_are_isolated() {
    let (_dir, store) = temp_store();
    store.save("a", &sheet(1, 10), ts("2026-05-01T00:00:00Z")).unwrap();
    store.save("b", &sheet(2, 20), ts("2026-05-01T00:00:00Z")).unwrap();

    assert_eq!(store.load_latest("a").unwrap().unwrap().data, sheet(1, 10));
    assert_eq!(store.load_latest("b").unwrap().unwrap().data, sheet(2, 20));
}

#[test]
fn test_fs_and_memory_stores_agree_on_digest() {
    let (_dir, fs_store) = temp_store();
    let mem = MemorySnapshotStore::new();
    let data = sheet(5, 38);
    let at = ts("2026-05-01T00:00:00Z");

    let a = fs_store.save("c", &data, at).unwrap();
    let b = mem.save("c", &data, at).unwrap();
    assert_eq!(a.digest, b.digest);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn test_previous_snapshot_moves_to_history() {
    let (_dir, store) = temp_store();
    store.save("c", &sheet(4, 27), ts("2026-05-01T00:00:00Z")).unwrap();
    store.save("c", &sheet(5, 33), ts("2026-05-02T00:00:00Z")).unwrap();

    let history = store.history("c").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].data, sheet(4, 27));
    assert_eq!(store.load_latest("c").unwrap().unwrap().data, sheet(5, 33));
}

// ---------------------------------------------------------------------------
// Corruption and versioning
// ---------------------------------------------------------------------------

#[test]
fn test_unsupported_format_version_is_persistence_error() {
    let (dir, store) = temp_store();
    let path = dir.path().join("c").join("latest.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        &path,
        serde_json::to_vec(&json!({
            "format_version": 99,
            "character_id": "c",
            "captured_at": "2026-05-01T00:00:00Z",
            "digest": "sha256:00",
            "data": {}
        }))
        .unwrap(),
    )
    .unwrap();

    let err = store.load_latest("c").unwrap_err();
    assert_eq!(err.kind(), SwErrorKind::Persistence);
    assert!(err.message().contains("format_version 99"));
}

#[test]
fn test_garbage_file_is_persistence_error() {
    let (dir, store) = temp_store();
    let path = dir.path().join("c").join("latest.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"{not json").unwrap();

    let err = store.load_latest("c").unwrap_err();
    assert_eq!(err.kind(), SwErrorKind::Persistence);
}

#[test]
fn test_save_over_corrupt_latest_recovers() {
    let (dir, store) = temp_store();
    let path = dir.path().join("c").join("latest.json");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"garbage").unwrap();

    store.save("c", &sheet(1, 8), ts("2026-05-01T00:00:00Z")).unwrap();
    assert_eq!(store.load_latest("c").unwrap().unwrap().data, sheet(1, 8));
}
