//! SheetWatch core: change detection, group filtering, notification routing
//! and the operation log.
//!
//! The pipeline is synchronous and pure up to the point where messages are
//! handed to a delivery service:
//!
//! ```text
//! (old, new) -> DetectionEngine -> CausationAnalyzer -> ChangeFilter -> NotificationRouter
//! ```

pub mod detection;
pub mod errors;
pub mod filter;
pub mod groups;
pub mod logging_facility;
pub mod notify;
pub mod oplog;
pub mod snapshot;

// Macros expand to `$crate::schema::*`.
pub use sheetwatch_core_types::schema;
pub use sheetwatch_core_types::{CycleId, Sensitive};

pub use detection::{
    ChangeCategory, ChangeDetector, ChangeRecord, ChangeType, DetectionContext, DetectionEngine,
    Priority,
};
pub use errors::{Result, SwError, SwErrorKind};
pub use filter::ChangeFilter;
pub use groups::GroupCatalog;
pub use notify::{NotificationContext, NotificationRouter, RouterConfig, WebhookMessage};
pub use oplog::{LogLevel, OperationKind, OperationLog, OperationStats};
pub use snapshot::{SnapshotStore, StoredSnapshot, SNAPSHOT_FORMAT_VERSION};
