//! Structured logging facility for SheetWatch
//!
//! This module provides:
//! - Single initialization point via `init(profile)`
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//! - Test capture mode for deterministic assertions
//!
//! The [`crate::oplog::OperationLog`] builds on top of this facility: it
//! emits through `tracing` and adds secret masking and rolling counters.
//!
//! # Usage
//!
//! ```rust
//! use sheetwatch_core::logging_facility::{init, Profile};
//!
//! // Initialize once at application startup
//! init(Profile::Development);
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
