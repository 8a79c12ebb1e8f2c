//! HTTP transport seam
//!
//! The delivery service talks to the network only through
//! [`WebhookTransport`], so tests can script responses and the paused tokio
//! clock stays in control of every wait.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sheetwatch_core::errors::{SwError, SwErrorKind};

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn kind(&self) -> SwErrorKind {
        match self {
            TransportError::Timeout => SwErrorKind::Timeout,
            TransportError::Connect(_) | TransportError::Request(_) => SwErrorKind::NetworkError,
        }
    }
}

impl From<TransportError> for SwError {
    fn from(err: TransportError) -> Self {
        SwError::new(err.kind())
            .with_op("webhook_request")
            .with_message(err.to_string())
    }
}

/// Status, lowercased headers and raw body of one HTTP exchange.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Header lookup by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration)
        -> Result<TransportResponse, TransportError>;

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn finish(
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<TransportResponse, TransportError> {
        let response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response.text().await.map_err(classify)?;
        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let result = self.client.get(url).timeout(timeout).send().await;
        Self::finish(result).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let result = self
            .client
            .post(url)
            .json(body)
            .timeout(timeout)
            .send()
            .await;
        Self::finish(result).await
    }
}

// reqwest errors print the request URL, which carries the token.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout;
    }
    let connect = err.is_connect();
    let detail = err.without_url().to_string();
    if connect {
        TransportError::Connect(detail)
    } else {
        TransportError::Request(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_are_case_insensitive() {
        let r = TransportResponse::new(204).with_header("X-RateLimit-Remaining", "4");
        assert_eq!(r.header("x-ratelimit-remaining"), Some("4"));
        assert_eq!(r.header("X-RATELIMIT-REMAINING"), Some("4"));
        assert!(r.is_success());
    }

    #[test]
    fn test_transport_error_kinds() {
        assert_eq!(TransportError::Timeout.kind(), SwErrorKind::Timeout);
        let err: SwError = TransportError::Connect("dns".into()).into();
        assert_eq!(err.kind(), SwErrorKind::NetworkError);
    }
}
