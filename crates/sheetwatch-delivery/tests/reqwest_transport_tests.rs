mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use sheetwatch_core::{OperationLog, Sensitive};
use sheetwatch_delivery::{
    DeliveryOutcome, DeliveryService, ReqwestTransport, RetryPolicy, SendOptions, TransportError,
    TransportResponse, WebhookTransport,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{message, WEBHOOK_URL};

const WEBHOOK_PATH: &str = "/api/webhooks/123456789012/abcDEF123456token";

/// Sends to the mock server while the service sees a provider URL.
struct Redirect {
    inner: ReqwestTransport,
    base: String,
}

impl Redirect {
    fn rewrite(&self, url: &str) -> String {
        url.replacen("https://discord.com", &self.base, 1)
    }
}

#[async_trait]
impl WebhookTransport for Redirect {
    async fn get(&self, url: &str, timeout: Duration) -> Result<TransportResponse, TransportError> {
        self.inner.get(&self.rewrite(url), timeout).await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        self.inner.post_json(&self.rewrite(url), body, timeout).await
    }
}

// ---------------------------------------------------------------------------
// Raw transport
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_post_captures_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .and(body_partial_json(json!({"content": "hello"})))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("X-RateLimit-Remaining", "0")
                .set_body_json(json!({
                    "message": "slow down",
                    "retry_after": 0.5,
                    "global": false
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new();
    let response = transport
        .post_json(
            &format!("{}{}", server.uri(), WEBHOOK_PATH),
            &json!({"content": "hello"}),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(response.header("x-ratelimit-remaining"), Some("0"));
    assert_eq!(response.json().unwrap()["retry_after"], 0.5);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = ReqwestTransport::new()
        .get(&server.uri(), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout));
}

#[tokio::test]
async fn test_refused_connection_hides_token() {
    // Port 9 (discard) is closed on test machines.
    let url = format!("http://127.0.0.1:9{}", WEBHOOK_PATH);
    let err = ReqwestTransport::new()
        .get(&url, Duration::from_secs(2))
        .await
        .unwrap_err();

    assert!(!err.to_string().contains("abcDEF123456token"));
}

// ---------------------------------------------------------------------------
// Service over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_service_retries_429_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"message": "limited", "retry_after": 0.05, "global": false})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let transport = Arc::new(Redirect {
        inner: ReqwestTransport::new(),
        base: server.uri(),
    });
    let svc = DeliveryService::new(
        Sensitive::new(WEBHOOK_URL.to_string()),
        transport,
        Arc::new(OperationLog::new()),
    )
    .with_policy(RetryPolicy::default().without_jitter());

    let outcome = svc.send(&message(), &SendOptions::default()).await;
    assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 2 });
}

#[tokio::test]
async fn test_service_validates_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "123456789012",
            "name": "Party Log",
            "channel_id": "1",
            "guild_id": "2",
            "token": "abcDEF123456token"
        })))
        .mount(&server)
        .await;

    let svc = DeliveryService::new(
        Sensitive::new(WEBHOOK_URL.to_string()),
        Arc::new(Redirect {
            inner: ReqwestTransport::new(),
            base: server.uri(),
        }),
        Arc::new(OperationLog::new()),
    );

    let result = svc.validate_endpoint().await;
    assert!(result.is_valid);
    assert_eq!(result.endpoint_info.unwrap().id, "123456789012");
}
