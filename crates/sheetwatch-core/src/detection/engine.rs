//! Detection engine: runs every registered detector over a snapshot pair.
//!
//! A detector that returns an error or panics is dropped from that pass;
//! the failure is reported to the [`OperationLog`] and the remaining
//! detectors still contribute their records.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sheetwatch_core_types::CycleId;

use crate::detection::causation::CausationAnalyzer;
use crate::detection::common::DetectionError;
use crate::detection::detectors::{default_detectors, ChangeDetector};
use crate::detection::model::ChangeRecord;
use crate::errors::SwErrorKind;
use crate::oplog::{LogLevel, OperationKind, OperationLog, OperationResult};

/// Per-pass context shared by all detectors.
#[derive(Debug, Clone)]
pub struct DetectionContext {
    pub character_id: String,
    pub character_name: Option<String>,
    pub cycle_id: CycleId,
    /// Timestamp stamped on every record of this pass.
    pub timestamp: DateTime<Utc>,
}

impl DetectionContext {
    pub fn new(character_id: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            character_name: None,
            cycle_id: CycleId::new(),
            timestamp: Utc::now(),
        }
    }

    /// Context with the character name read from `character_info.name`.
    pub fn from_snapshot(character_id: impl Into<String>, snapshot: &Value) -> Self {
        let name = snapshot
            .pointer("/character_info/name")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            character_name: name,
            ..Self::new(character_id)
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_cycle_id(mut self, cycle_id: CycleId) -> Self {
        self.cycle_id = cycle_id;
        self
    }

    pub fn with_character_name(mut self, name: impl Into<String>) -> Self {
        self.character_name = Some(name.into());
        self
    }

    /// Name for display: the character name if known, else the id.
    pub fn display_name(&self) -> &str {
        self.character_name.as_deref().unwrap_or(&self.character_id)
    }
}

/// A detector that was dropped from a pass.
#[derive(Debug, Clone)]
pub struct DetectorFailure {
    pub detector: &'static str,
    pub error: DetectionError,
}

/// Records plus the detectors that failed.
#[derive(Debug, Clone, Default)]
pub struct DetectionReport {
    pub changes: Vec<ChangeRecord>,
    pub failures: Vec<DetectorFailure>,
}

impl OperationResult for DetectionReport {
    fn error_kind(&self) -> Option<SwErrorKind> {
        None
    }

    fn summary(&self) -> String {
        format!(
            "{} changes, {} detector failures",
            self.changes.len(),
            self.failures.len()
        )
    }
}

/// Registry of detectors plus the causation pass.
pub struct DetectionEngine {
    detectors: Vec<Box<dyn ChangeDetector>>,
    causation: Option<CausationAnalyzer>,
    log: Arc<OperationLog>,
}

impl DetectionEngine {
    /// Engine with no detectors registered.
    pub fn new(log: Arc<OperationLog>) -> Self {
        Self {
            detectors: Vec::new(),
            causation: Some(CausationAnalyzer::new()),
            log,
        }
    }

    /// Engine with every built-in detector.
    pub fn with_default_detectors(log: Arc<OperationLog>) -> Self {
        let mut engine = Self::new(log);
        for detector in default_detectors() {
            engine.register(detector);
        }
        engine
    }

    pub fn register(&mut self, detector: Box<dyn ChangeDetector>) {
        self.detectors.push(detector);
    }

    /// Skip causation analysis.
    pub fn without_causation(mut self) -> Self {
        self.causation = None;
        self
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn operation_log(&self) -> &Arc<OperationLog> {
        &self.log
    }

    /// Run all detectors and return the records.
    pub fn detect(&self, old: &Value, new: &Value, ctx: &DetectionContext) -> Vec<ChangeRecord> {
        self.detect_with_report(old, new, ctx).changes
    }

    /// Run all detectors; failures are isolated and listed in the report.
    pub fn detect_with_report(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> DetectionReport {
        self.log
            .timed(OperationKind::Detection, || self.run(old, new, ctx))
    }

    fn run(&self, old: &Value, new: &Value, ctx: &DetectionContext) -> DetectionReport {
        let mut report = DetectionReport::default();

        if !old.is_object() || !new.is_object() {
            self.log.record(
                OperationKind::Detection,
                LogLevel::Error,
                "snapshot root is not an object",
                Some(&json!({
                    "character_id": ctx.character_id,
                    "old_is_object": old.is_object(),
                    "new_is_object": new.is_object(),
                })),
                Some(SwErrorKind::MalformedSnapshot),
            );
            return report;
        }

        for detector in &self.detectors {
            let outcome = catch_unwind(AssertUnwindSafe(|| detector.detect_changes(old, new, ctx)))
                .unwrap_or_else(|payload| {
                    Err(DetectionError::Panicked {
                        detector: detector.name().to_string(),
                        message: panic_message(payload.as_ref()),
                    })
                });

            match outcome {
                Ok(mut records) => report.changes.append(&mut records),
                Err(error) => {
                    self.log.record(
                        OperationKind::Detection,
                        LogLevel::Error,
                        &format!("detector `{}` failed: {}", detector.name(), error),
                        Some(&json!({
                            "detector": detector.name(),
                            "character_id": ctx.character_id,
                            "field_path": error.path(),
                        })),
                        Some(SwErrorKind::DetectionError),
                    );
                    report.failures.push(DetectorFailure {
                        detector: detector.name(),
                        error,
                    });
                }
            }
        }

        if let Some(analyzer) = &self.causation {
            report.changes = analyzer.analyze(std::mem::take(&mut report.changes));
        }
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
