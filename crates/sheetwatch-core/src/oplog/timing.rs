use std::future::Future;
use std::time::Instant;

use serde_json::json;

use super::{LogLevel, OperationKind, OperationLog};
use crate::errors::{SwError, SwErrorKind};
use crate::{log_op_end, log_op_error, log_op_start};

/// Outcome of a timed operation, as far as the log is concerned.
pub trait OperationResult {
    /// `Some` when the operation failed.
    fn error_kind(&self) -> Option<SwErrorKind>;

    /// One-line description for the completion record.
    fn summary(&self) -> String {
        String::new()
    }
}

impl<T> OperationResult for Result<T, SwError> {
    fn error_kind(&self) -> Option<SwErrorKind> {
        self.as_ref().err().map(SwError::kind)
    }

    fn summary(&self) -> String {
        match self {
            Ok(_) => "ok".to_string(),
            Err(e) => e.to_string(),
        }
    }
}

impl<T> OperationResult for Vec<T> {
    fn error_kind(&self) -> Option<SwErrorKind> {
        None
    }

    fn summary(&self) -> String {
        format!("{} items", self.len())
    }
}

impl OperationLog {
    /// Run `f`, logging start/end and recording the outcome.
    pub fn timed<R, F>(&self, kind: OperationKind, f: F) -> R
    where
        R: OperationResult,
        F: FnOnce() -> R,
    {
        log_op_start!(kind.as_str());
        let start = Instant::now();
        let result = f();
        self.finish(kind, start, &result);
        result
    }

    /// Async form of [`OperationLog::timed`].
    pub async fn timed_async<R, Fut>(&self, kind: OperationKind, fut: Fut) -> R
    where
        R: OperationResult,
        Fut: Future<Output = R>,
    {
        log_op_start!(kind.as_str());
        let start = Instant::now();
        let result = fut.await;
        self.finish(kind, start, &result);
        result
    }

    fn finish<R: OperationResult>(&self, kind: OperationKind, start: Instant, result: &R) {
        let duration_ms = start.elapsed().as_millis() as u64;
        let summary = result.summary();
        let details = json!({ "duration_ms": duration_ms, "summary": summary });
        match result.error_kind() {
            None => {
                log_op_end!(kind.as_str(), duration_ms = duration_ms);
                self.record(
                    kind,
                    LogLevel::Debug,
                    &format!("{} completed", kind.as_str()),
                    Some(&details),
                    None,
                );
            }
            Some(err_kind) => {
                log_op_error!(
                    kind.as_str(),
                    SwError::new(err_kind).with_op(kind.as_str()),
                    duration_ms = duration_ms
                );
                self.record(
                    kind,
                    LogLevel::Error,
                    &format!("{} failed: {}", kind.as_str(), summary),
                    Some(&details),
                    Some(err_kind),
                );
            }
        }
    }
}
