//! SheetWatch Engine - monitor configuration and cycle orchestration
//!
//! A [`Monitor`] ties the pipeline together for one character:
//! load previous snapshot, detect, filter, route, deliver, save.

pub mod config;
pub mod monitor;
pub mod source;

pub use config::{EndpointConfig, FilterConfig, MonitorConfig};
pub use monitor::{ChangeSummary, CycleOutcome, CycleReport, Monitor, PollSummary};
pub use source::{FileSnapshotSource, SnapshotSource};
