//! Webhook URL grammar
//!
//! `https://<host>/api[/v<N>]/webhooks/<numeric id>/<token>` where host is
//! one of the provider's webhook hosts. A URL still carrying an unresolved
//! `${VAR}` placeholder is accepted as-is and never probed.

use reqwest::Url;

const WEBHOOK_HOSTS: &[&str] = &[
    "discord.com",
    "discordapp.com",
    "canary.discord.com",
    "ptb.discord.com",
    "canary.discordapp.com",
    "ptb.discordapp.com",
];

/// A syntactically valid webhook URL, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrl {
    pub host: String,
    pub api_version: Option<u32>,
    pub id: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    Valid(WebhookUrl),
    /// Contains `${...}`; format cannot be judged until expanded.
    Placeholder,
    Invalid(String),
}

impl UrlCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, UrlCheck::Valid(_))
    }
}

pub fn has_placeholder(raw: &str) -> bool {
    raw.find("${")
        .is_some_and(|start| raw[start..].contains('}'))
}

/// Check `raw` against the webhook grammar. Error strings never repeat the
/// token.
pub fn check_webhook_url(raw: &str) -> UrlCheck {
    let raw = raw.trim();
    if raw.is_empty() {
        return UrlCheck::Invalid("webhook URL is empty".to_string());
    }
    if has_placeholder(raw) {
        return UrlCheck::Placeholder;
    }

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => return UrlCheck::Invalid(format!("not a URL: {}", e)),
    };
    if url.scheme() != "https" {
        return UrlCheck::Invalid(format!("scheme must be https, got {}", url.scheme()));
    }
    let host = match url.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return UrlCheck::Invalid("URL has no host".to_string()),
    };
    if !WEBHOOK_HOSTS.contains(&host.as_str()) {
        return UrlCheck::Invalid(format!("{} is not a webhook host", host));
    }

    let segments: Vec<&str> = match url.path_segments() {
        Some(s) => s.filter(|s| !s.is_empty()).collect(),
        None => return UrlCheck::Invalid("URL has no path".to_string()),
    };
    parse_path(&segments)
        .map(|(api_version, id, token)| {
            UrlCheck::Valid(WebhookUrl {
                host,
                api_version,
                id: id.to_string(),
                token: token.to_string(),
            })
        })
        .unwrap_or_else(UrlCheck::Invalid)
}

fn parse_path<'a>(segments: &[&'a str]) -> Result<(Option<u32>, &'a str, &'a str), String> {
    let shape = || "path must be /api[/vN]/webhooks/<id>/<token>".to_string();

    let rest = match segments.split_first() {
        Some((&"api", rest)) => rest,
        _ => return Err(shape()),
    };
    let (api_version, rest) = match rest.split_first() {
        Some((v, tail)) if v.starts_with('v') => {
            let n = v
                .get(1..)
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(|_| format!("bad API version segment `{}`", v))?;
            (Some(n), tail)
        }
        _ => (None, rest),
    };
    let [webhooks, id, token] = rest else {
        return Err(shape());
    };
    if *webhooks != "webhooks" {
        return Err(shape());
    }
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err("webhook id must be numeric".to_string());
    }
    if !token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("webhook token has invalid characters".to_string());
    }
    Ok((api_version, *id, *token))
}
