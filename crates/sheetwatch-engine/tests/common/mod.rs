use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sheetwatch_core::{OperationLog, Sensitive};
use sheetwatch_delivery::{
    DeliveryFanout, DeliveryService, RetryPolicy, TransportError, TransportResponse,
    WebhookTransport,
};

#[allow(dead_code)]
pub const WEBHOOK_URL: &str = "https://discord.com/api/webhooks/123456789012/abcDEF123456token";

/// Answers every request with the same status and keeps the POST bodies.
pub struct FixedTransport {
    status: u16,
    bodies: Mutex<Vec<Value>>,
}

#[allow(dead_code)]
impl FixedTransport {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            bodies: Mutex::new(Vec::new()),
        })
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for FixedTransport {
    async fn get(
        &self,
        _url: &str,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(self.status))
    }

    async fn post_json(
        &self,
        _url: &str,
        body: &Value,
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.bodies.lock().unwrap().push(body.clone());
        Ok(TransportResponse::new(self.status))
    }
}

#[allow(dead_code)]
pub fn fanout(transport: Arc<FixedTransport>, log: &Arc<OperationLog>) -> DeliveryFanout {
    DeliveryFanout::new(vec![Arc::new(
        DeliveryService::new(Sensitive::new(WEBHOOK_URL.to_string()), transport, log.clone())
            .with_name("party")
            .with_policy(RetryPolicy::default().without_jitter()),
    )])
}

#[allow(dead_code)]
pub fn sheet(level: u64, hp_max: u64) -> Value {
    json!({
        "character_info": {"name": "Vex", "level": level},
        "combat": {"hit_points": {"maximum": hp_max, "current": 20}}
    })
}
