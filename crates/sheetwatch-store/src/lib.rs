//! SheetWatch Store - snapshot persistence
//!
//! Provides:
//! - Filesystem store with atomic writes and bounded history
//! - In-memory store for tests and one-shot CLI runs
//! - Canonical SHA256 digests of snapshot documents

pub mod digest;
pub mod errors;
pub mod fs;
pub mod memory;

pub use digest::snapshot_digest;
pub use errors::Result;
pub use fs::FsSnapshotStore;
pub use memory::MemorySnapshotStore;
