//! Webhook payload types and provider limits.

use serde::{Deserialize, Serialize};

use crate::errors::{SwError, SwErrorKind};

pub const MAX_CONTENT_CHARS: usize = 2000;
pub const MAX_EMBEDS: usize = 10;
pub const MAX_TITLE_CHARS: usize = 256;
pub const MAX_DESCRIPTION_CHARS: usize = 4096;
pub const MAX_FIELDS: usize = 25;
pub const MAX_FIELD_NAME_CHARS: usize = 256;
pub const MAX_FIELD_VALUE_CHARS: usize = 1024;
pub const MAX_FOOTER_CHARS: usize = 2048;
pub const MAX_USERNAME_CHARS: usize = 80;
/// Combined embed text across one message.
pub const MAX_TOTAL_EMBED_CHARS: usize = 6000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

fn chars(s: &str) -> usize {
    s.chars().count()
}

impl EmbedField {
    pub fn char_count(&self) -> usize {
        chars(&self.name) + chars(&self.value)
    }
}

impl Embed {
    /// Characters counted against the per-message total.
    pub fn char_count(&self) -> usize {
        self.title.as_deref().map_or(0, chars)
            + self.description.as_deref().map_or(0, chars)
            + self.fields.iter().map(EmbedField::char_count).sum::<usize>()
            + self.footer.as_ref().map_or(0, |f| chars(&f.text))
    }

    fn validate(&self, idx: usize) -> Result<(), String> {
        check(self.title.as_deref(), MAX_TITLE_CHARS, &format!("embeds[{}].title", idx))?;
        check(
            self.description.as_deref(),
            MAX_DESCRIPTION_CHARS,
            &format!("embeds[{}].description", idx),
        )?;
        if self.fields.len() > MAX_FIELDS {
            return Err(format!(
                "embeds[{}] has {} fields (max {})",
                idx,
                self.fields.len(),
                MAX_FIELDS
            ));
        }
        for (f, field) in self.fields.iter().enumerate() {
            let at = format!("embeds[{}].fields[{}]", idx, f);
            if field.name.trim().is_empty() || field.value.trim().is_empty() {
                return Err(format!("{} must have a non-empty name and value", at));
            }
            check(Some(&field.name), MAX_FIELD_NAME_CHARS, &format!("{}.name", at))?;
            check(Some(&field.value), MAX_FIELD_VALUE_CHARS, &format!("{}.value", at))?;
        }
        check(
            self.footer.as_ref().map(|f| f.text.as_str()),
            MAX_FOOTER_CHARS,
            &format!("embeds[{}].footer.text", idx),
        )
    }
}

fn check(value: Option<&str>, max: usize, what: &str) -> Result<(), String> {
    match value {
        Some(v) if chars(v) > max => Err(format!("{} is {} characters (max {})", what, chars(v), max)),
        _ => Ok(()),
    }
}

impl WebhookMessage {
    /// Check provider limits before anything goes on the wire.
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` naming the first violated limit.
    pub fn validate(&self) -> Result<(), SwError> {
        self.check_limits().map_err(|msg| {
            SwError::new(SwErrorKind::ValidationError)
                .with_op("validate_message")
                .with_message(msg)
        })
    }

    fn check_limits(&self) -> Result<(), String> {
        let has_content = self.content.as_deref().is_some_and(|c| !c.trim().is_empty());
        if !has_content && self.embeds.is_empty() {
            return Err("message has neither content nor embeds".to_string());
        }
        check(self.content.as_deref(), MAX_CONTENT_CHARS, "content")?;
        check(self.username.as_deref(), MAX_USERNAME_CHARS, "username")?;
        if self.embeds.len() > MAX_EMBEDS {
            return Err(format!(
                "message has {} embeds (max {})",
                self.embeds.len(),
                MAX_EMBEDS
            ));
        }
        for (idx, embed) in self.embeds.iter().enumerate() {
            embed.validate(idx)?;
        }
        let total = self.total_embed_chars();
        if total > MAX_TOTAL_EMBED_CHARS {
            return Err(format!(
                "embeds total {} characters (max {})",
                total, MAX_TOTAL_EMBED_CHARS
            ));
        }
        Ok(())
    }

    pub fn total_embed_chars(&self) -> usize {
        self.embeds.iter().map(Embed::char_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, value: &str) -> EmbedField {
        EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }

    #[test]
    fn test_empty_message_rejected() {
        let err = WebhookMessage::default().validate().unwrap_err();
        assert_eq!(err.kind(), SwErrorKind::ValidationError);
    }

    #[test]
    fn test_content_limit() {
        let msg = WebhookMessage {
            content: Some("x".repeat(MAX_CONTENT_CHARS + 1)),
            ..Default::default()
        };
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_too_many_fields() {
        let msg = WebhookMessage {
            embeds: vec![Embed {
                fields: (0..26).map(|i| field(&i.to_string(), "v")).collect(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let err = msg.validate().unwrap_err();
        assert!(err.message().contains("26 fields"));
    }

    #[test]
    fn test_total_limit_across_embeds() {
        let embed = Embed {
            description: Some("d".repeat(3000)),
            ..Default::default()
        };
        let msg = WebhookMessage {
            embeds: vec![embed.clone(), embed.clone(), embed],
            ..Default::default()
        };
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_serialization_skips_empty_parts() {
        let msg = WebhookMessage {
            content: Some("hi".into()),
            ..Default::default()
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v, serde_json::json!({"content": "hi"}));
    }
}
