//! Concurrent delivery to several endpoints

use std::sync::Arc;

use futures::future::join_all;
use sheetwatch_core::notify::WebhookMessage;

use crate::outcome::DeliveryOutcome;
use crate::service::{DeliveryService, SendOptions};
use crate::validation::WebhookValidationResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointReport {
    pub endpoint: String,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl EndpointReport {
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_delivered()).count()
    }

    pub fn all_delivered(&self) -> bool {
        self.delivered() == self.outcomes.len()
    }
}

/// Each endpoint receives every message in order; endpoints proceed
/// independently of one another.
#[derive(Default)]
pub struct DeliveryFanout {
    services: Vec<Arc<DeliveryService>>,
}

impl DeliveryFanout {
    pub fn new(services: Vec<Arc<DeliveryService>>) -> Self {
        Self { services }
    }

    pub fn push(&mut self, service: Arc<DeliveryService>) {
        self.services.push(service);
    }

    pub fn services(&self) -> &[Arc<DeliveryService>] {
        &self.services
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Reports in registration order, once every endpoint has finished.
    pub async fn deliver(
        &self,
        messages: &[WebhookMessage],
        options: &SendOptions,
    ) -> Vec<EndpointReport> {
        join_all(self.services.iter().map(|service| async move {
            EndpointReport {
                endpoint: service.name().to_string(),
                outcomes: service.send_all(messages, options).await,
            }
        }))
        .await
    }

    pub async fn validate_all(&self) -> Vec<(String, WebhookValidationResult)> {
        join_all(self.services.iter().map(|service| async move {
            (service.name().to_string(), service.validate_endpoint().await)
        }))
        .await
    }
}
