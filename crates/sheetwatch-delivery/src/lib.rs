//! SheetWatch Delivery - webhook notification delivery
//!
//! One [`DeliveryService`] per endpoint owns that endpoint's rate-limit
//! state and serializes its sends; [`DeliveryFanout`] delivers to several
//! endpoints concurrently.

pub mod fanout;
pub mod outcome;
pub mod rate_limit;
pub mod retry;
pub mod service;
pub mod transport;
pub mod url;
pub mod validation;

pub use fanout::{DeliveryFanout, EndpointReport};
pub use outcome::DeliveryOutcome;
pub use rate_limit::{DeliveryAttemptState, MAX_SERVER_WAIT};
pub use retry::RetryPolicy;
pub use service::{DeliveryService, SendOptions};
pub use transport::{ReqwestTransport, TransportError, TransportResponse, WebhookTransport};
pub use url::{check_webhook_url, UrlCheck, WebhookUrl};
pub use validation::{EndpointInfo, WebhookValidationResult};
