//! Webhook delivery service
//!
//! One service per endpoint. The attempt state sits behind an async mutex
//! held for the whole send, so sends to one endpoint are serialized. State
//! is updated only after a response or transport failure has been observed;
//! a send dropped mid-wait leaves it untouched.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use sheetwatch_core::errors::SwErrorKind;
use sheetwatch_core::notify::WebhookMessage;
use sheetwatch_core::oplog::{LogLevel, OperationKind, OperationLog};
use sheetwatch_core::Sensitive;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::outcome::DeliveryOutcome;
use crate::rate_limit::{retry_after_of, DeliveryAttemptState};
use crate::retry::RetryPolicy;
use crate::transport::{TransportResponse, WebhookTransport};
use crate::url::{check_webhook_url, UrlCheck};
use crate::validation::{EndpointInfo, WebhookValidationResult};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Return `RateLimited` instead of waiting out a rate-limit window.
    pub non_blocking: bool,
    /// Give up once this moment has passed.
    pub deadline: Option<Instant>,
}

impl SendOptions {
    pub fn non_blocking() -> Self {
        Self {
            non_blocking: true,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

enum StatusClass {
    Success,
    RateLimited,
    Rejected(SwErrorKind),
    Transient(SwErrorKind),
}

fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        429 => StatusClass::RateLimited,
        400 => StatusClass::Rejected(SwErrorKind::ValidationError),
        401 | 403 => StatusClass::Rejected(SwErrorKind::PermissionError),
        404 => StatusClass::Rejected(SwErrorKind::WebhookNotFound),
        500..=599 => StatusClass::Transient(SwErrorKind::ServerError),
        _ => StatusClass::Rejected(SwErrorKind::UnknownError),
    }
}

/// Provider `message` field if present, else the status line.
fn error_detail(response: &TransportResponse) -> String {
    response
        .json()
        .and_then(|b| b.get("message").and_then(Value::as_str).map(str::to_string))
        .map(|m| format!("HTTP {}: {}", response.status, m))
        .unwrap_or_else(|| format!("HTTP {}", response.status))
}

pub struct DeliveryService {
    name: String,
    url: Sensitive<String>,
    transport: Arc<dyn WebhookTransport>,
    policy: RetryPolicy,
    request_timeout: Duration,
    non_blocking: bool,
    log: Arc<OperationLog>,
    state: Mutex<DeliveryAttemptState>,
}

impl DeliveryService {
    pub fn new(
        url: Sensitive<String>,
        transport: Arc<dyn WebhookTransport>,
        log: Arc<OperationLog>,
    ) -> Self {
        Self {
            name: "default".to_string(),
            url,
            transport,
            policy: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            non_blocking: false,
            log,
            state: Mutex::new(DeliveryAttemptState::default()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Never wait out rate limits on this endpoint, whatever the send
    /// options say.
    pub fn with_non_blocking(mut self, non_blocking: bool) -> Self {
        self.non_blocking = non_blocking;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Endpoint URL with id and token masked.
    pub fn masked_url(&self) -> String {
        self.url.masked()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Copy of the current attempt state. Waits for any in-flight send.
    pub async fn state(&self) -> DeliveryAttemptState {
        self.state.lock().await.clone()
    }

    /// Deliver one message, retrying transient failures and waiting out
    /// rate limits within the policy's attempt budget.
    pub async fn send(&self, message: &WebhookMessage, options: &SendOptions) -> DeliveryOutcome {
        self.log
            .timed_async(OperationKind::WebhookDelivery, self.send_inner(message, options))
            .await
    }

    /// Deliver messages in order. After an endpoint-level rejection
    /// (not found, permission) the rest are rejected without a request.
    pub async fn send_all(
        &self,
        messages: &[WebhookMessage],
        options: &SendOptions,
    ) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(messages.len());
        let mut fatal: Option<DeliveryOutcome> = None;
        for message in messages {
            if let Some(outcome) = &fatal {
                outcomes.push(outcome.clone());
                continue;
            }
            let outcome = self.send(message, options).await;
            if let DeliveryOutcome::Rejected { kind, .. } = &outcome {
                if matches!(
                    kind,
                    SwErrorKind::WebhookNotFound | SwErrorKind::PermissionError
                ) {
                    fatal = Some(outcome.clone());
                }
            }
            outcomes.push(outcome);
        }
        outcomes
    }

    async fn send_inner(&self, message: &WebhookMessage, options: &SendOptions) -> DeliveryOutcome {
        if let Err(e) = message.validate() {
            return DeliveryOutcome::Rejected {
                kind: SwErrorKind::ValidationError,
                detail: e.message().to_string(),
            };
        }
        match check_webhook_url(self.url.expose()) {
            UrlCheck::Valid(_) => {}
            UrlCheck::Placeholder => {
                return DeliveryOutcome::Rejected {
                    kind: SwErrorKind::ValidationError,
                    detail: "webhook URL still contains an unresolved ${...} placeholder"
                        .to_string(),
                }
            }
            UrlCheck::Invalid(reason) => {
                return DeliveryOutcome::Rejected {
                    kind: SwErrorKind::ValidationError,
                    detail: reason,
                }
            }
        }
        let body = match serde_json::to_value(message) {
            Ok(body) => body,
            Err(e) => {
                return DeliveryOutcome::Rejected {
                    kind: SwErrorKind::Serialization,
                    detail: e.to_string(),
                }
            }
        };

        let non_blocking = options.non_blocking || self.non_blocking;
        let mut state = self.state.lock().await;
        let max_attempts = self.policy.attempts();
        let mut attempt: u32 = 0;

        loop {
            if let Some(wait) = state.wait_needed(Instant::now()) {
                if non_blocking {
                    return DeliveryOutcome::RateLimited {
                        retry_after: wait,
                        global: false,
                    };
                }
                if self.past_deadline(options, wait) {
                    return deadline_exceeded(
                        SwErrorKind::RateLimited,
                        "rate limit outlasts the deadline",
                    );
                }
                self.log.record(
                    OperationKind::WebhookDelivery,
                    LogLevel::Info,
                    "waiting for rate limit reset",
                    Some(&json!({
                        "endpoint": self.masked_url(),
                        "wait_ms": wait.as_millis() as u64,
                    })),
                    None,
                );
                tokio::time::sleep(wait).await;
            }

            let timeout = match options.deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return deadline_exceeded(
                            SwErrorKind::Timeout,
                            "deadline passed before the request",
                        );
                    }
                    left.min(self.request_timeout)
                }
                None => self.request_timeout,
            };

            attempt += 1;
            let result = self
                .transport
                .post_json(self.url.expose(), &body, timeout)
                .await;
            let now = Instant::now();

            let (kind, detail) = match result {
                Ok(response) => {
                    state.observe_headers(&response, now);
                    match classify_status(response.status) {
                        StatusClass::Success => {
                            state.record_success();
                            return DeliveryOutcome::Delivered { attempts: attempt };
                        }
                        StatusClass::RateLimited => {
                            let (retry_after, global) = retry_after_of(&response);
                            state.block_for(retry_after, now);
                            self.log
                                .record_rate_limit(self.url.expose(), retry_after, global);
                            self.log_attempt(
                                attempt,
                                "rate limited",
                                SwErrorKind::RateLimited,
                                Some(retry_after),
                            );
                            if non_blocking || attempt >= max_attempts {
                                return DeliveryOutcome::RateLimited {
                                    retry_after,
                                    global,
                                };
                            }
                            continue;
                        }
                        StatusClass::Rejected(kind) => {
                            state.record_failure(kind);
                            return DeliveryOutcome::Rejected {
                                kind,
                                detail: error_detail(&response),
                            };
                        }
                        StatusClass::Transient(kind) => (kind, error_detail(&response)),
                    }
                }
                Err(e) => (e.kind(), e.to_string()),
            };

            state.record_failure(kind);
            self.log_attempt(attempt, &detail, kind, None);
            if attempt >= max_attempts {
                return DeliveryOutcome::TransientFailure { kind, detail };
            }
            let delay = self.policy.backoff(attempt);
            if self.past_deadline(options, delay) {
                return DeliveryOutcome::TransientFailure { kind, detail };
            }
            tokio::time::sleep(delay).await;
        }
    }

    fn past_deadline(&self, options: &SendOptions, wait: Duration) -> bool {
        options
            .deadline
            .is_some_and(|deadline| {
                Instant::now()
                    .checked_add(wait)
                    .map_or(true, |until| until > deadline)
            })
    }

    fn log_attempt(
        &self,
        attempt: u32,
        detail: &str,
        kind: SwErrorKind,
        retry_after: Option<Duration>,
    ) {
        self.log.record(
            OperationKind::WebhookDelivery,
            LogLevel::Warn,
            &format!("attempt {} failed: {}", attempt, detail),
            Some(&json!({
                "endpoint": self.masked_url(),
                "attempt": attempt,
                "code": kind.code(),
                "retry_after_ms": retry_after.map(|d| d.as_millis() as u64),
            })),
            None,
        );
    }

    /// Check the URL format, then probe the endpoint with a GET.
    ///
    /// A URL with unresolved `${VAR}` placeholders is reported valid without
    /// a probe.
    pub async fn validate_endpoint(&self) -> WebhookValidationResult {
        self.log
            .timed_async(OperationKind::WebhookValidation, self.probe())
            .await
    }

    async fn probe(&self) -> WebhookValidationResult {
        let parts = match check_webhook_url(self.url.expose()) {
            UrlCheck::Valid(parts) => parts,
            UrlCheck::Placeholder => return WebhookValidationResult::valid(None),
            UrlCheck::Invalid(reason) => {
                return WebhookValidationResult::invalid(SwErrorKind::ValidationError, reason)
            }
        };

        let response = match self
            .transport
            .get(self.url.expose(), self.request_timeout)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                return WebhookValidationResult::invalid(SwErrorKind::NetworkError, e.to_string())
            }
        };

        match response.status {
            200 => {
                let mut info = response
                    .json()
                    .map(|body| EndpointInfo::from_body(&body))
                    .unwrap_or_default();
                if info.id.is_empty() {
                    info.id = parts.id;
                }
                WebhookValidationResult::valid(Some(info))
            }
            404 => WebhookValidationResult::invalid(
                SwErrorKind::WebhookNotFound,
                error_detail(&response),
            ),
            401 | 403 => WebhookValidationResult::invalid(
                SwErrorKind::PermissionError,
                error_detail(&response),
            ),
            429 => {
                let (retry_after, _) = retry_after_of(&response);
                let now = Instant::now();
                {
                    let mut state = self.state.lock().await;
                    state.observe_headers(&response, now);
                    state.block_for(retry_after, now);
                }
                WebhookValidationResult::invalid(SwErrorKind::RateLimited, error_detail(&response))
                    .with_retry_after(retry_after)
            }
            500..=599 => WebhookValidationResult::invalid(
                SwErrorKind::ServerError,
                error_detail(&response),
            ),
            _ => WebhookValidationResult::invalid(
                SwErrorKind::UnknownError,
                error_detail(&response),
            ),
        }
    }
}

fn deadline_exceeded(kind: SwErrorKind, detail: &str) -> DeliveryOutcome {
    DeliveryOutcome::TransientFailure {
        kind,
        detail: detail.to_string(),
    }
}
