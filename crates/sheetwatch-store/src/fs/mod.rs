//! Filesystem snapshot store

mod atomic;
mod store;

pub use atomic::atomic_write;
pub use store::FsSnapshotStore;
