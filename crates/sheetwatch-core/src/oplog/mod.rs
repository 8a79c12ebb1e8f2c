//! Operation log: structured, secret-masked records plus in-memory counters.
//!
//! Every record is emitted as a `tracing` event (`event = "record"`) after
//! its message and details have been sanitized. Counters are kept per
//! operation and per error kind; rate-limit events are kept for a rolling
//! window (24 hours by default) and pruned on insert and on read.

pub mod sanitize;
mod timing;

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sheetwatch_core_types::{mask_webhook_urls_in, schema};

use crate::errors::SwErrorKind;

pub use sanitize::{is_sensitive_key, sanitize_details};
pub use timing::OperationResult;

/// Pipeline operation a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Detection,
    Filtering,
    Routing,
    WebhookValidation,
    WebhookDelivery,
    SnapshotLoad,
    SnapshotSave,
    MonitorCycle,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Detection => "detection",
            OperationKind::Filtering => "filtering",
            OperationKind::Routing => "routing",
            OperationKind::WebhookValidation => "webhook_validation",
            OperationKind::WebhookDelivery => "webhook_delivery",
            OperationKind::SnapshotLoad => "snapshot_load",
            OperationKind::SnapshotSave => "snapshot_save",
            OperationKind::MonitorCycle => "monitor_cycle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OperationCount {
    pub total: u64,
    pub errors: u64,
}

/// A 429 seen by the delivery service. The endpoint is stored masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitEvent {
    pub at: DateTime<Utc>,
    pub endpoint: String,
    pub retry_after_ms: u64,
    pub global: bool,
}

/// Serializable snapshot of the counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OperationStats {
    pub operation_counts: BTreeMap<String, OperationCount>,
    pub error_counts: BTreeMap<String, u64>,
    pub recent_rate_limit_events: Vec<RateLimitEvent>,
}

#[derive(Default)]
struct LogState {
    operation_counts: BTreeMap<OperationKind, OperationCount>,
    error_counts: BTreeMap<SwErrorKind, u64>,
    rate_limit_events: VecDeque<RateLimitEvent>,
}

pub struct OperationLog {
    state: Mutex<LogState>,
    window: chrono::Duration,
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationLog {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LogState::default()),
            window: chrono::Duration::hours(24),
        }
    }

    /// Override the rate-limit retention window.
    pub fn with_rate_limit_window(mut self, window: Duration) -> Self {
        if let Ok(w) = chrono::Duration::from_std(window) {
            self.window = w;
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, LogState> {
        // Counters stay usable even if a holder panicked.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record one operation event.
    ///
    /// `details` is sanitized before it is emitted; `message` has webhook
    /// URLs masked. `Error` level increments the operation's error count;
    /// `error_kind` increments the per-kind count regardless of level.
    pub fn record(
        &self,
        kind: OperationKind,
        level: LogLevel,
        message: &str,
        details: Option<&Value>,
        error_kind: Option<SwErrorKind>,
    ) {
        {
            let mut state = self.lock();
            let counts = state.operation_counts.entry(kind).or_default();
            counts.total += 1;
            if level == LogLevel::Error {
                counts.errors += 1;
            }
            if let Some(k) = error_kind {
                *state.error_counts.entry(k).or_insert(0) += 1;
            }
        }

        let message = mask_webhook_urls_in(message);
        let details = details
            .map(|d| sanitize_details(d).to_string())
            .unwrap_or_default();
        let code = error_kind.map(|k| k.code()).unwrap_or("");

        macro_rules! emit {
            ($lvl:expr) => {
                tracing::event!(
                    $lvl,
                    component = module_path!(),
                    op = kind.as_str(),
                    event = schema::EVENT_RECORD,
                    details = details.as_str(),
                    err.code = code,
                    "{}",
                    message
                )
            };
        }

        match level {
            LogLevel::Debug => emit!(tracing::Level::DEBUG),
            LogLevel::Info => emit!(tracing::Level::INFO),
            LogLevel::Warn => emit!(tracing::Level::WARN),
            LogLevel::Error => emit!(tracing::Level::ERROR),
        }
    }

    /// Remember a rate-limit response for the stats window.
    pub fn record_rate_limit(&self, endpoint: &str, retry_after: Duration, global: bool) {
        self.record_rate_limit_at(Utc::now(), endpoint, retry_after, global);
    }

    pub fn record_rate_limit_at(
        &self,
        at: DateTime<Utc>,
        endpoint: &str,
        retry_after: Duration,
        global: bool,
    ) {
        let event = RateLimitEvent {
            at,
            endpoint: mask_webhook_urls_in(endpoint),
            retry_after_ms: retry_after.as_millis() as u64,
            global,
        };
        let mut state = self.lock();
        state.rate_limit_events.push_back(event);
        prune(&mut state.rate_limit_events, at - self.window);
    }

    /// Snapshot of all counters; rate-limit events older than the window
    /// are dropped first.
    pub fn get_operation_stats(&self) -> OperationStats {
        let mut state = self.lock();
        prune(&mut state.rate_limit_events, Utc::now() - self.window);
        OperationStats {
            operation_counts: state
                .operation_counts
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
            error_counts: state
                .error_counts
                .iter()
                .map(|(k, v)| (k.code().to_string(), *v))
                .collect(),
            recent_rate_limit_events: state.rate_limit_events.iter().cloned().collect(),
        }
    }
}

fn prune(events: &mut VecDeque<RateLimitEvent>, cutoff: DateTime<Utc>) {
    events.retain(|e| e.at >= cutoff);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_per_operation_and_error_kind() {
        let log = OperationLog::new();
        log.record(OperationKind::Detection, LogLevel::Info, "ok", None, None);
        log.record(
            OperationKind::Detection,
            LogLevel::Error,
            "bad",
            None,
            Some(SwErrorKind::DetectionError),
        );
        log.record(
            OperationKind::Filtering,
            LogLevel::Warn,
            "unknown group",
            Some(&json!({"group": "nope"})),
            Some(SwErrorKind::FilterResolutionWarning),
        );

        let stats = log.get_operation_stats();
        assert_eq!(
            stats.operation_counts["detection"],
            OperationCount { total: 2, errors: 1 }
        );
        assert_eq!(
            stats.operation_counts["filtering"],
            OperationCount { total: 1, errors: 0 }
        );
        assert_eq!(stats.error_counts["DETECTION_ERROR"], 1);
        assert_eq!(stats.error_counts["FILTER_RESOLUTION_WARNING"], 1);
    }

    #[test]
    fn test_rate_limit_events_outside_window_are_pruned() {
        let log = OperationLog::new();
        let now = Utc::now();
        log.record_rate_limit_at(
            now - chrono::Duration::hours(25),
            "party",
            Duration::from_secs(5),
            false,
        );
        log.record_rate_limit_at(now, "party", Duration::from_secs(2), true);

        let stats = log.get_operation_stats();
        assert_eq!(stats.recent_rate_limit_events.len(), 1);
        assert_eq!(stats.recent_rate_limit_events[0].retry_after_ms, 2000);
        assert!(stats.recent_rate_limit_events[0].global);
    }

    #[test]
    fn test_rate_limit_endpoint_is_masked() {
        let log = OperationLog::new();
        log.record_rate_limit(
            "https://discord.com/api/webhooks/123456789012/abcDEF123456token",
            Duration::from_secs(1),
            false,
        );
        let stats = log.get_operation_stats();
        assert!(!stats.recent_rate_limit_events[0]
            .endpoint
            .contains("abcDEF123456token"));
    }

    #[test]
    fn test_stats_serialize() {
        let log = OperationLog::new();
        log.record(OperationKind::Routing, LogLevel::Debug, "m", None, None);
        let v = serde_json::to_value(log.get_operation_stats()).unwrap();
        assert_eq!(v["operation_counts"]["routing"]["total"], 1);
        assert!(v["recent_rate_limit_events"].as_array().unwrap().is_empty());
    }
}
