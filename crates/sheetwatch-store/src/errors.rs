//! Error helpers for sheetwatch-store
//!
//! Wraps sheetwatch-core SwError with store-specific constructors

use sheetwatch_core::errors::{SwError, SwErrorKind};

/// Result type alias using SwError
pub type Result<T> = std::result::Result<T, SwError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> SwError {
    SwError::new(SwErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Stored data that cannot be decoded
pub fn corrupt_snapshot(character_id: &str, reason: &str) -> SwError {
    SwError::new(SwErrorKind::Persistence)
        .with_op("load_snapshot")
        .with_message(format!(
            "stored snapshot for {} is unreadable: {}",
            character_id, reason
        ))
}

/// Stored data written by an unknown format version
pub fn unsupported_version(character_id: &str, version: u32) -> SwError {
    SwError::new(SwErrorKind::Persistence)
        .with_op("load_snapshot")
        .with_message(format!(
            "stored snapshot for {} has unsupported format_version {}",
            character_id, version
        ))
}

/// Character ids become directory names
pub fn invalid_character_id(character_id: &str) -> SwError {
    SwError::new(SwErrorKind::ValidationError)
        .with_op("snapshot_path")
        .with_message(format!(
            "character id `{}` must be non-empty and use only letters, digits, '-', '_' or '.'",
            character_id
        ))
}
