//! Sensitive data marker and masking primitives
//!
//! The `Sensitive<T>` wrapper ensures that secrets (webhook URLs, tokens,
//! API keys) are never accidentally logged or displayed. The free functions
//! produce the masked forms used by the operation log sanitizer.

use serde::{Deserialize, Deserializer};
use std::fmt;

/// Placeholder for secrets too short to partially reveal.
pub const MASK_PLACEHOLDER: &str = "***";

const WEBHOOK_MARKER: &str = "/webhooks/";

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use sheetwatch_core_types::Sensitive;
///
/// let url = Sensitive::new("https://discord.com/api/webhooks/1/secret".to_string());
/// println!("{:?}", url); // Prints: ***REDACTED***
///
/// // Access the actual value when needed
/// assert!(url.expose().ends_with("secret"));
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Use this method sparingly and only when the secret must be used
    /// (e.g., to issue the HTTP request).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Sensitive<String> {
    /// Diagnosable masked form: webhook URLs keep their host and path shape,
    /// anything else is masked as a plain secret.
    pub fn masked(&self) -> String {
        if self.0.contains(WEBHOOK_MARKER) {
            mask_webhook_url(&self.0)
        } else {
            mask_secret(&self.0)
        }
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Sensitive)
    }
}

/// Mask a secret string: `first4...last4` when longer than 8 characters,
/// otherwise the constant placeholder.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return MASK_PLACEHOLDER.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Mask the id and token segments of a webhook URL, preserving scheme, host
/// and path shape.
///
/// ```
/// use sheetwatch_core_types::mask_webhook_url;
///
/// let masked = mask_webhook_url("https://discord.com/api/webhooks/123456789012/abcDEF123456token");
/// assert_eq!(masked, "https://discord.com/api/webhooks/1234...9012/abcD...oken");
/// ```
pub fn mask_webhook_url(url: &str) -> String {
    mask_webhook_urls_in(url)
}

/// Mask every webhook URL embedded in free text (log messages, error bodies).
pub fn mask_webhook_urls_in(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find(WEBHOOK_MARKER) {
        let split = idx + WEBHOOK_MARKER.len();
        out.push_str(&rest[..split]);
        rest = &rest[split..];

        let (id, after_id) = take_segment(rest);
        out.push_str(&mask_segment(id));
        rest = after_id;

        if let Some(after_slash) = rest.strip_prefix('/') {
            out.push('/');
            let (token, after_token) = take_segment(after_slash);
            out.push_str(&mask_segment(token));
            rest = after_token;
        }
    }

    out.push_str(rest);
    out
}

fn take_segment(s: &str) -> (&str, &str) {
    let end = s.find(is_segment_delimiter).unwrap_or(s.len());
    s.split_at(end)
}

fn is_segment_delimiter(c: char) -> bool {
    matches!(
        c,
        '/' | '?' | '#' | '"' | '\'' | '<' | '>' | '(' | ')' | '[' | ']' | ',' | ';'
    ) || c.is_whitespace()
}

fn mask_segment(segment: &str) -> String {
    if segment.is_empty() {
        String::new()
    } else {
        mask_secret(segment)
    }
}
