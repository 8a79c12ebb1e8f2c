//! Operation boundary events
//!
//! Each stage of a monitor cycle (fetch, detect, filter, render, deliver,
//! persist) is bracketed by a `start` event and exactly one of `end` or
//! `end_error`. All three share the `op` field so one stage can be followed
//! through a noisy log. Any trailing `key = value` pairs are handed to
//! `tracing` untouched, so callers can attach `character_id`, `endpoint`
//! and the like.
//!
//! The macros reach `tracing` through this crate, so callers do not need
//! their own dependency on it.

#[doc(hidden)]
pub use tracing as __tracing;

/// Emit the `start` event for `op`.
///
/// ```
/// # use sheetwatch_core::log_op_start;
/// log_op_start!("monitor_cycle");
/// log_op_start!("snapshot_save", character_id = "48213904");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::logging_facility::macros::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($($field)+)?
        )
    };
}

/// Emit the `end` event for `op`. `duration_ms` is required.
///
/// ```
/// # use sheetwatch_core::log_op_end;
/// log_op_end!("snapshot_save", duration_ms = 4_u64, character_id = "48213904");
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::logging_facility::macros::__tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)+)?
        )
    };
}

/// Emit the `end_error` event for `op`.
///
/// `$err` is anything convertible into [`SwError`](crate::errors::SwError);
/// its kind, code and message are attached as `err.*` fields.
///
/// ```
/// # use sheetwatch_core::log_op_error;
/// # use sheetwatch_core::errors::{SwError, SwErrorKind};
/// let failure = SwError::new(SwErrorKind::WebhookNotFound).with_op("webhook_send");
/// log_op_error!("webhook_send", failure, duration_ms = 250_u64, endpoint = "party");
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let failure: $crate::errors::SwError = $err.into();
        $crate::logging_facility::macros::__tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?failure.kind(),
            err.code = failure.code(),
            err.message = failure.message(),
            $($($field)+)?
        )
    }};
}
