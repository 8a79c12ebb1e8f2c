//! Endpoint validation result

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sheetwatch_core::errors::SwErrorKind;
use sheetwatch_core::oplog::OperationResult;

/// Metadata returned by a successful probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub id: String,
    pub name: Option<String>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl EndpointInfo {
    pub(crate) fn from_body(body: &Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            id: text("id").unwrap_or_default(),
            name: text("name"),
            channel_id: text("channel_id"),
            guild_id: text("guild_id"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookValidationResult {
    pub is_valid: bool,
    pub endpoint_info: Option<EndpointInfo>,
    /// Stable code of the failure kind, e.g. `WEBHOOK_NOT_FOUND`.
    pub error_kind: Option<&'static str>,
    pub error_message: Option<String>,
    pub remediation_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_ms: Option<u64>,
    #[serde(skip)]
    kind: Option<SwErrorKind>,
}

impl WebhookValidationResult {
    pub fn valid(endpoint_info: Option<EndpointInfo>) -> Self {
        Self {
            is_valid: true,
            endpoint_info,
            error_kind: None,
            error_message: None,
            remediation_steps: Vec::new(),
            retry_after_ms: None,
            kind: None,
        }
    }

    pub fn invalid(kind: SwErrorKind, message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            endpoint_info: None,
            error_kind: Some(kind.code()),
            error_message: Some(message.into()),
            remediation_steps: kind
                .remediation_steps()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            retry_after_ms: None,
            kind: Some(kind),
        }
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after_ms = Some(retry_after.as_millis() as u64);
        self
    }

    pub fn kind(&self) -> Option<SwErrorKind> {
        self.kind
    }
}

impl OperationResult for WebhookValidationResult {
    fn error_kind(&self) -> Option<SwErrorKind> {
        self.kind
    }

    fn summary(&self) -> String {
        match (&self.error_kind, &self.error_message) {
            (Some(code), Some(msg)) => format!("{}: {}", code, msg),
            _ => "valid".to_string(),
        }
    }
}
