//! Builds webhook messages from change records.
//!
//! Records below the minimum priority are dropped, the rest are grouped by
//! category in order of first appearance, one embed per category (split
//! when a category exceeds the per-embed limits), and embeds are packed into
//! as few messages as the per-message limits allow.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use crate::detection::common::display_value;
use crate::detection::model::{ChangeCategory, ChangeRecord, ChangeType, Priority};
use crate::notify::message::{
    Embed, EmbedField, EmbedFooter, WebhookMessage, MAX_CONTENT_CHARS, MAX_EMBEDS,
    MAX_FIELDS, MAX_FIELD_NAME_CHARS, MAX_FIELD_VALUE_CHARS, MAX_TOTAL_EMBED_CHARS,
};

/// Embed colours per highest priority in the embed.
pub fn priority_color(priority: Priority) -> u32 {
    match priority {
        Priority::Critical => 0xE74C3C,
        Priority::High => 0xE67E22,
        Priority::Medium => 0xF1C40F,
        Priority::Low => 0x95A5A6,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub min_priority: Priority,
    pub group_by_category: bool,
    /// Cap on records rendered; the rest are summarised in the footer.
    pub max_changes: Option<usize>,
    /// Use the detailed description as the field value.
    pub include_detailed: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            username: Some("SheetWatch".to_string()),
            avatar_url: None,
            min_priority: Priority::Low,
            group_by_category: true,
            max_changes: None,
            include_detailed: false,
        }
    }
}

/// Who the notification is about.
#[derive(Debug, Clone)]
pub struct NotificationContext {
    pub character_id: String,
    pub character_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NotificationContext {
    fn display_name(&self) -> &str {
        self.character_name.as_deref().unwrap_or(&self.character_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotificationRouter {
    config: RouterConfig,
}

impl NotificationRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Build messages for `records`. No eligible records, no messages.
    pub fn route(&self, records: &[ChangeRecord], ctx: &NotificationContext) -> Vec<WebhookMessage> {
        let selected: Vec<&ChangeRecord> = records
            .iter()
            .filter(|r| r.priority() >= self.config.min_priority)
            .collect();
        if selected.is_empty() {
            return Vec::new();
        }

        let total = selected.len();
        let shown = self.config.max_changes.map_or(total, |max| max.min(total));
        let omitted = total - shown;
        let selected = &selected[..shown];

        let footer = format!("Character: {}", ctx.display_name());
        let timestamp = ctx.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut embeds = Vec::new();
        for (category, group) in self.group(selected) {
            embeds.extend(self.embeds_for(category, &group, &footer, &timestamp));
        }
        if omitted > 0 {
            if let Some(last) = embeds.last_mut() {
                last.footer = Some(EmbedFooter {
                    text: format!("{} | ... and {} more", footer, omitted),
                });
            }
        }

        let content = summary_line(ctx.display_name(), selected, omitted);
        self.pack(embeds, content)
    }

    fn group<'a>(
        &self,
        records: &[&'a ChangeRecord],
    ) -> Vec<(Option<ChangeCategory>, Vec<&'a ChangeRecord>)> {
        if !self.config.group_by_category {
            return vec![(None, records.to_vec())];
        }
        let mut groups: Vec<(Option<ChangeCategory>, Vec<&ChangeRecord>)> = Vec::new();
        for &r in records {
            match groups.iter_mut().find(|(c, _)| *c == Some(r.category())) {
                Some((_, members)) => members.push(r),
                None => groups.push((Some(r.category()), vec![r])),
            }
        }
        groups
    }

    fn embeds_for(
        &self,
        category: Option<ChangeCategory>,
        records: &[&ChangeRecord],
        footer: &str,
        timestamp: &str,
    ) -> Vec<Embed> {
        let title = category.map_or("Changes", |c| c.display_name());
        let color = records
            .iter()
            .map(|r| r.priority())
            .max()
            .map(priority_color);
        let new_embed = |first: bool| Embed {
            title: Some(if first {
                title.to_string()
            } else {
                format!("{} (cont.)", title)
            }),
            description: first.then(|| plural(records.len(), "change")),
            color,
            fields: Vec::new(),
            footer: Some(EmbedFooter {
                text: footer.to_string(),
            }),
            timestamp: Some(timestamp.to_string()),
        };

        // Leave room for the "... and N more" footer suffix.
        let budget = MAX_TOTAL_EMBED_CHARS - 64;
        let mut out = Vec::new();
        let mut current = new_embed(true);
        for r in records {
            let field = self.field_for(r);
            if current.fields.len() == MAX_FIELDS
                || current.char_count() + field.char_count() > budget
            {
                out.push(std::mem::replace(&mut current, new_embed(false)));
            }
            current.fields.push(field);
        }
        out.push(current);
        out
    }

    fn field_for(&self, r: &ChangeRecord) -> EmbedField {
        let name = if r.description().is_empty() {
            r.field_path().to_string()
        } else {
            r.description().to_string()
        };
        let mut value = if self.config.include_detailed && !r.detailed_description().is_empty() {
            r.detailed_description().to_string()
        } else {
            value_text(r)
        };
        if let Some(c) = r.causation() {
            value.push_str(&format!("\n_caused by {}_", c.trigger_details));
        }
        if let Some(a) = r.attribution() {
            value.push_str(&format!("\n_from {} {}_", a.source_type, a.source_name));
        }
        EmbedField {
            name: truncate(&format!("{} {}", marker(r.priority()), name), MAX_FIELD_NAME_CHARS),
            value: truncate(&value, MAX_FIELD_VALUE_CHARS),
            inline: false,
        }
    }

    fn pack(&self, embeds: Vec<Embed>, content: String) -> Vec<WebhookMessage> {
        let mut messages: Vec<WebhookMessage> = Vec::new();
        let mut current = self.blank_message();
        current.content = Some(truncate(&content, MAX_CONTENT_CHARS));
        for embed in embeds {
            let fits = current.embeds.len() < MAX_EMBEDS
                && current.total_embed_chars() + embed.char_count() <= MAX_TOTAL_EMBED_CHARS;
            if !fits && !current.embeds.is_empty() {
                messages.push(std::mem::replace(&mut current, self.blank_message()));
            }
            current.embeds.push(embed);
        }
        messages.push(current);
        messages
    }

    fn blank_message(&self) -> WebhookMessage {
        WebhookMessage {
            username: self.config.username.clone(),
            avatar_url: self.config.avatar_url.clone(),
            content: None,
            embeds: Vec::new(),
        }
    }
}

fn marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "[!]",
        Priority::High => "[+]",
        Priority::Medium => "[*]",
        Priority::Low => "[-]",
    }
}

fn value_text(r: &ChangeRecord) -> String {
    match (r.change_type(), r.old_value(), r.new_value()) {
        (ChangeType::Added, _, Some(n)) => format!("Added: {}", display_value(n)),
        (ChangeType::Removed, Some(o), _) => format!("Removed: {}", display_value(o)),
        (_, Some(o), Some(n)) => format!("{} → {}", display_value(o), display_value(n)),
        _ => r.change_type().as_str().to_string(),
    }
}

fn summary_line(name: &str, records: &[&ChangeRecord], omitted: usize) -> String {
    let total = records.len() + omitted;
    let critical = records
        .iter()
        .filter(|r| r.priority() == Priority::Critical)
        .count();
    let mut line = format!("**{}** has {}", name, plural(total, "change"));
    if critical > 0 {
        line.push_str(&format!(", including {} critical", critical));
    }
    line
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}
