//! Per-endpoint rate-limit bookkeeping
//!
//! Uses `tokio::time::Instant` so waits follow the runtime clock (and the
//! paused clock in tests).

use std::time::Duration;

use sheetwatch_core::errors::SwErrorKind;
use tokio::time::Instant;

use crate::transport::TransportResponse;

const HEADER_REMAINING: &str = "x-ratelimit-remaining";
const HEADER_RESET_AFTER: &str = "x-ratelimit-reset-after";
const HEADER_RETRY_AFTER: &str = "retry-after";

/// Upper bound on any wait a server can impose.
pub const MAX_SERVER_WAIT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryAttemptState {
    pub rate_limit_remaining: Option<u32>,
    pub rate_limit_reset_at: Option<Instant>,
    /// Set by a 429; no request is made before this moment.
    pub blocked_until: Option<Instant>,
    pub consecutive_failures: u32,
    pub last_error_kind: Option<SwErrorKind>,
}

impl DeliveryAttemptState {
    /// How long the next request must wait, if at all.
    pub fn wait_needed(&self, now: Instant) -> Option<Duration> {
        let blocked = self.blocked_until.filter(|t| *t > now);
        let exhausted = match (self.rate_limit_remaining, self.rate_limit_reset_at) {
            (Some(0), Some(reset)) if reset > now => Some(reset),
            _ => None,
        };
        blocked
            .into_iter()
            .chain(exhausted)
            .max()
            .map(|until| until - now)
    }

    /// Track `X-RateLimit-*` headers from any response.
    pub fn observe_headers(&mut self, response: &TransportResponse, now: Instant) {
        if let Some(remaining) = response
            .header(HEADER_REMAINING)
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            self.rate_limit_remaining = Some(remaining);
        }
        if let Some(reset_after) = response.header(HEADER_RESET_AFTER).and_then(parse_seconds) {
            self.rate_limit_reset_at = Some(later(now, reset_after));
        }
    }

    /// Block until `now + retry_after`.
    pub fn block_for(&mut self, retry_after: Duration, now: Instant) {
        self.blocked_until = Some(later(now, retry_after));
        self.last_error_kind = Some(SwErrorKind::RateLimited);
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.last_error_kind = None;
    }

    pub fn record_failure(&mut self, kind: SwErrorKind) {
        self.consecutive_failures += 1;
        self.last_error_kind = Some(kind);
    }
}

/// Wait demanded by a 429: body `retry_after` (float seconds), falling back
/// to the `Retry-After` header. The flag is the body's `global`.
pub fn retry_after_of(response: &TransportResponse) -> (Duration, bool) {
    let body = response.json();
    let global = body
        .as_ref()
        .and_then(|b| b.get("global"))
        .and_then(|g| g.as_bool())
        .unwrap_or(false);
    let from_body = body
        .as_ref()
        .and_then(|b| b.get("retry_after"))
        .and_then(|v| v.as_f64())
        .and_then(seconds);
    let retry_after = from_body
        .or_else(|| response.header(HEADER_RETRY_AFTER).and_then(parse_seconds))
        .unwrap_or(Duration::from_secs(1));
    (retry_after, global)
}

fn parse_seconds(raw: &str) -> Option<Duration> {
    raw.trim().parse::<f64>().ok().and_then(seconds)
}

/// Non-negative seconds, clamped to [`MAX_SERVER_WAIT`]. NaN and negative
/// values are rejected; overly large ones saturate.
fn seconds(value: f64) -> Option<Duration> {
    if value.is_nan() || value < 0.0 {
        return None;
    }
    let wait = Duration::try_from_secs_f64(value).unwrap_or(MAX_SERVER_WAIT);
    Some(wait.min(MAX_SERVER_WAIT))
}

/// `now + wait`, saturating at `now + MAX_SERVER_WAIT`.
fn later(now: Instant, wait: Duration) -> Instant {
    let wait = wait.min(MAX_SERVER_WAIT);
    now.checked_add(wait).unwrap_or(now)
}
