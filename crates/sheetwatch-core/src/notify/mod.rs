//! Notification payloads and the router that builds them from change
//! records.

pub mod message;
pub mod router;

pub use message::{Embed, EmbedField, EmbedFooter, WebhookMessage};
pub use router::{NotificationContext, NotificationRouter, RouterConfig};
