//! Secret masking for operation-log details.
//!
//! Values under a sensitive key are masked whatever their position in the
//! tree. Webhook URLs are masked wherever they appear, including inside
//! free text under non-sensitive keys.

use serde_json::{Map, Value};
use sheetwatch_core_types::{
    mask_secret, mask_webhook_url, mask_webhook_urls_in, MASK_PLACEHOLDER,
};

/// Key fragments that mark a value as sensitive (case-insensitive substring).
pub const SENSITIVE_KEYWORDS: &[&str] = &[
    "token",
    "secret",
    "password",
    "passwd",
    "cookie",
    "authorization",
    "auth",
    "key",
    "session",
    "credential",
    "webhook_url",
];

pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    SENSITIVE_KEYWORDS.iter().any(|kw| key.contains(kw))
}

/// Deep copy of `value` with sensitive data masked.
pub fn sanitize_details(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (k, v) in map {
                let masked = if is_sensitive_key(k) {
                    mask_sensitive_value(v)
                } else {
                    sanitize_details(v)
                };
                out.insert(k.clone(), masked);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sanitize_details).collect()),
        Value::String(s) => Value::String(mask_webhook_urls_in(s)),
        other => other.clone(),
    }
}

/// Mask a value found under a sensitive key. Strings keep a diagnosable
/// prefix and suffix; any other non-null value is replaced wholesale.
fn mask_sensitive_value(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) if s.contains("/webhooks/") => Value::String(mask_webhook_url(s)),
        Value::String(s) => Value::String(mask_secret(s)),
        _ => Value::String(MASK_PLACEHOLDER.to_string()),
    }
}
