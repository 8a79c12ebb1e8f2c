//! Atomic write primitives
//!
//! Uses temp→rename so readers never observe a partial snapshot

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically write bytes to a file, creating parent directories
pub fn atomic_write(target_path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_snapshot_dir", e))?;
    }

    // Same directory as the target so the rename stays on one filesystem.
    let temp_path = target_path.with_extension("json.tmp");

    fs::write(&temp_path, content).map_err(|e| io_error("write_snapshot_temp", e))?;
    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_snapshot_temp", e))?;

    Ok(())
}
