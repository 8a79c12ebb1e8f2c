//! Change detection: snapshot pair in, ordered change records out.

pub mod causation;
pub mod common;
pub mod detectors;
pub mod engine;
pub mod human_summary;
pub mod model;

pub use causation::CausationAnalyzer;
pub use common::DetectionError;
pub use detectors::{default_detectors, ChangeDetector};
pub use engine::{DetectionContext, DetectionEngine, DetectionReport, DetectorFailure};
pub use human_summary::render_human_summary;
pub use model::{Attribution, Causation, ChangeCategory, ChangeRecord, ChangeType, Priority};
