use std::time::Duration;

use sheetwatch_core::errors::SwErrorKind;
use sheetwatch_core::oplog::OperationResult;

/// Final result of one `send`, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered {
        attempts: u32,
    },
    /// Still rate limited when the attempt budget ran out, or in
    /// non-blocking mode.
    RateLimited {
        retry_after: Duration,
        global: bool,
    },
    /// Terminal; retrying cannot help.
    Rejected {
        kind: SwErrorKind,
        detail: String,
    },
    /// Transient failure that outlived the retry budget or deadline.
    TransientFailure {
        kind: SwErrorKind,
        detail: String,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn error_kind(&self) -> Option<SwErrorKind> {
        match self {
            DeliveryOutcome::Delivered { .. } => None,
            DeliveryOutcome::RateLimited { .. } => Some(SwErrorKind::RateLimited),
            DeliveryOutcome::Rejected { kind, .. }
            | DeliveryOutcome::TransientFailure { kind, .. } => Some(*kind),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered { .. } => "delivered",
            DeliveryOutcome::RateLimited { .. } => "rate_limited",
            DeliveryOutcome::Rejected { .. } => "rejected",
            DeliveryOutcome::TransientFailure { .. } => "transient_failure",
        }
    }
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryOutcome::Delivered { attempts } => {
                write!(f, "delivered after {} attempt(s)", attempts)
            }
            DeliveryOutcome::RateLimited {
                retry_after,
                global,
            } => write!(
                f,
                "rate limited{} for {:.1}s",
                if *global { " (global)" } else { "" },
                retry_after.as_secs_f64()
            ),
            DeliveryOutcome::Rejected { kind, detail } => {
                write!(f, "rejected [{}]: {}", kind.code(), detail)
            }
            DeliveryOutcome::TransientFailure { kind, detail } => {
                write!(f, "failed [{}]: {}", kind.code(), detail)
            }
        }
    }
}

impl OperationResult for DeliveryOutcome {
    fn error_kind(&self) -> Option<SwErrorKind> {
        DeliveryOutcome::error_kind(self)
    }

    fn summary(&self) -> String {
        self.to_string()
    }
}
