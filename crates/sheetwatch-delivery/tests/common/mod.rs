use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sheetwatch_core::notify::{Embed, EmbedField, WebhookMessage};
use sheetwatch_core::{OperationLog, Sensitive};
use sheetwatch_delivery::{
    DeliveryService, RetryPolicy, TransportError, TransportResponse, WebhookTransport,
};
use tokio::time::Instant;

#[allow(dead_code)]
pub const WEBHOOK_URL: &str = "https://discord.com/api/webhooks/123456789012/abcDEF123456token";

/// One observed request.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Call {
    pub method: &'static str,
    pub at: Instant,
    pub body: Option<Value>,
}

/// Transport replaying a fixed script; 204 once the script runs out.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    calls: Mutex<Vec<Call>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new(
        script: impl IntoIterator<Item = Result<TransportResponse, TransportError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn next(
        &self,
        method: &'static str,
        body: Option<Value>,
    ) -> Result<TransportResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            at: Instant::now(),
            body,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TransportResponse::new(204)))
    }
}

#[async_trait]
impl WebhookTransport for ScriptedTransport {
    async fn get(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.next("GET", None)
    }

    async fn post_json(
        &self,
        _url: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.next("POST", Some(body.clone()))
    }
}

#[allow(dead_code)]
pub fn service(transport: Arc<ScriptedTransport>) -> (DeliveryService, Arc<OperationLog>) {
    service_for(WEBHOOK_URL, transport)
}

#[allow(dead_code)]
pub fn service_for(
    url: &str,
    transport: Arc<ScriptedTransport>,
) -> (DeliveryService, Arc<OperationLog>) {
    let log = Arc::new(OperationLog::new());
    let svc = DeliveryService::new(Sensitive::new(url.to_string()), transport, log.clone())
        .with_policy(RetryPolicy::default().without_jitter());
    (svc, log)
}

#[allow(dead_code)]
pub fn message() -> WebhookMessage {
    WebhookMessage {
        username: Some("SheetWatch".into()),
        content: Some("**Vex** has 1 change".into()),
        embeds: vec![Embed {
            title: Some("Combat".into()),
            fields: vec![EmbedField {
                name: "Maximum HP increased from 32 to 38".into(),
                value: "32 → 38".into(),
                inline: false,
            }],
            ..Embed::default()
        }],
        ..WebhookMessage::default()
    }
}

#[allow(dead_code)]
pub fn rate_limited(retry_after: f64) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse::new(429).with_body(format!(
        r#"{{"message": "You are being rate limited.", "retry_after": {}, "global": false}}"#,
        retry_after
    )))
}

#[allow(dead_code)]
pub fn status(code: u16) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse::new(code))
}

/// Start and end of one request seen by [`SlowTransport`].
#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
pub struct Span {
    pub start: Instant,
    pub end: Instant,
}

/// Transport that holds every request open for `latency`, then answers from
/// a script (204 once it runs out).
pub struct SlowTransport {
    latency: Duration,
    script: Mutex<VecDeque<TransportResponse>>,
    spans: Mutex<Vec<Span>>,
}

#[allow(dead_code)]
impl SlowTransport {
    pub fn new(
        latency: Duration,
        script: impl IntoIterator<Item = TransportResponse>,
    ) -> Arc<Self> {
        Arc::new(Self {
            latency,
            script: Mutex::new(script.into_iter().collect()),
            spans: Mutex::new(Vec::new()),
        })
    }

    /// Spans ordered by start time.
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = self.spans.lock().unwrap().clone();
        spans.sort_by_key(|s| s.start);
        spans
    }

    async fn answer(&self) -> Result<TransportResponse, TransportError> {
        let start = Instant::now();
        tokio::time::sleep(self.latency).await;
        self.spans.lock().unwrap().push(Span {
            start,
            end: Instant::now(),
        });
        Ok(self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TransportResponse::new(204)))
    }
}

#[async_trait]
impl WebhookTransport for SlowTransport {
    async fn get(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.answer().await
    }

    async fn post_json(
        &self,
        _url: &str,
        _body: &Value,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.answer().await
    }
}
