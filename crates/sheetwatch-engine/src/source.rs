//! Where fresh snapshots come from

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use sheetwatch_core::errors::{Result, SwError, SwErrorKind};

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Current snapshot of `character_id`.
    async fn fetch(&self, character_id: &str) -> Result<Value>;
}

/// Reads a JSON document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn fetch(&self, character_id: &str) -> Result<Value> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SwError::new(SwErrorKind::Io)
                .with_op("read_snapshot_file")
                .with_message(format!("{}: {}", self.path.display(), e))
        })?;
        parse_snapshot(character_id, &bytes)
    }
}

/// Parse a snapshot document; the root must be a JSON object.
///
/// # Errors
///
/// `MALFORMED_SNAPSHOT` for invalid JSON or a non-object root.
pub fn parse_snapshot(character_id: &str, bytes: &[u8]) -> Result<Value> {
    let malformed = |message: String| {
        SwError::new(SwErrorKind::MalformedSnapshot)
            .with_op("parse_snapshot")
            .with_message(format!("{}: {}", character_id, message))
    };
    let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("snapshot root is not an object".to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_non_object() {
        let err = parse_snapshot("c1", b"[1, 2]").unwrap_err();
        assert_eq!(err.kind(), SwErrorKind::MalformedSnapshot);
        let err = parse_snapshot("c1", b"{oops").unwrap_err();
        assert_eq!(err.kind(), SwErrorKind::MalformedSnapshot);
        assert!(parse_snapshot("c1", b"{}").is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = FileSnapshotSource::new("/nonexistent/sheet.json");
        let err = source.fetch("c1").await.unwrap_err();
        assert_eq!(err.kind(), SwErrorKind::Io);
    }
}
