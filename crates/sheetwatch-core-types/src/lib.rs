//! Core types shared across SheetWatch facilities
//!
//! This crate provides foundational types used by the change pipeline,
//! the delivery service and the logging facility:
//!
//! - **Correlation types**: CycleId for tying one monitoring cycle together
//! - **Sensitive data**: Sensitive<T> marker plus the masking primitives
//!   used wherever a secret might reach a log line
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use correlation::CycleId;
pub use sensitive::{
    mask_secret, mask_webhook_url, mask_webhook_urls_in, Sensitive, MASK_PLACEHOLDER,
};
