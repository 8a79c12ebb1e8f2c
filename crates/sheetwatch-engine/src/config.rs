//! Monitor configuration
//!
//! Loaded with the `config` crate from an optional file (format by
//! extension, TOML usually) overlaid with `SHEETWATCH__*` environment
//! variables, e.g. `SHEETWATCH__CHARACTER_ID` or `SHEETWATCH__FILTER__PRESET`.
//! `${VAR}` placeholders in webhook URLs are expanded from the process
//! environment after loading; unresolved ones are left in place.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sheetwatch_core::errors::{Result, SwError, SwErrorKind};
use sheetwatch_core::groups::catalog::ALL_GROUPS;
use sheetwatch_core::groups::preset;
use sheetwatch_core::{ChangeFilter, GroupCatalog, Priority, RouterConfig, Sensitive};
use sheetwatch_delivery::RetryPolicy;

const ENV_PREFIX: &str = "SHEETWATCH";
const ENV_SEPARATOR: &str = "__";

fn config_error(err: config::ConfigError) -> SwError {
    SwError::new(SwErrorKind::ConfigError)
        .with_op("load_config")
        .with_message(err.to_string())
}

fn invalid(message: impl Into<String>) -> SwError {
    SwError::new(SwErrorKind::ConfigError)
        .with_op("validate_config")
        .with_message(message)
}

/// Which changes are worth a notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub preset: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub min_priority: Option<Priority>,
}

impl FilterConfig {
    /// Build the filter. With neither a preset nor include list, every core
    /// group is included.
    ///
    /// # Errors
    ///
    /// `CONFIG_ERROR` for an unknown preset.
    pub fn build(&self, catalog: &GroupCatalog) -> Result<ChangeFilter> {
        let filter = match &self.preset {
            Some(name) => ChangeFilter::from_preset(catalog, name)?,
            None if self.include.is_empty() && self.exclude.is_empty() => ChangeFilter::default(),
            None if self.include.is_empty() => {
                ChangeFilter::new(catalog, &[ALL_GROUPS], &self.exclude[..])
            }
            None => ChangeFilter::new(catalog, &self.include[..], &self.exclude[..]),
        };
        Ok(match self.min_priority {
            Some(min) => filter.with_min_priority(min),
            None => filter,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub webhook_url: Sensitive<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub non_blocking: bool,
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".sheetwatch/snapshots")
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_history_limit() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    pub character_id: String,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub notification: RouterConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl MonitorConfig {
    /// Load from `path` (if any) plus `SHEETWATCH__*` overrides.
    ///
    /// # Errors
    ///
    /// `CONFIG_ERROR` when the file is missing or malformed, a required
    /// field is absent, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .map_err(config_error)?;
        Self::finish(settings, |name| std::env::var(name).ok())
    }

    /// Parse TOML text, without environment overrides.
    ///
    /// # Errors
    ///
    /// `CONFIG_ERROR` as for [`MonitorConfig::load`].
    pub fn from_toml_str<F>(text: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()
            .map_err(config_error)?;
        Self::finish(settings, lookup)
    }

    fn finish<F>(settings: config::Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg: MonitorConfig = settings.try_deserialize().map_err(config_error)?;
        for endpoint in &mut cfg.endpoints {
            let expanded = expand_placeholders(endpoint.webhook_url.expose(), &lookup);
            endpoint.webhook_url = Sensitive::new(expanded);
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// `CONFIG_ERROR` naming the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.character_id.trim().is_empty() {
            return Err(invalid("character_id must not be empty"));
        }
        if self.poll_interval_secs == 0 {
            return Err(invalid("poll_interval_secs must be at least 1"));
        }
        if let Some(name) = &self.filter.preset {
            if preset(name).is_none() {
                return Err(invalid(format!("unknown filter preset `{}`", name)));
            }
            if !self.filter.include.is_empty() || !self.filter.exclude.is_empty() {
                return Err(invalid(
                    "filter.preset cannot be combined with filter.include or filter.exclude",
                ));
            }
        }
        let mut names = BTreeSet::new();
        for endpoint in &self.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(invalid("endpoint name must not be empty"));
            }
            if !names.insert(endpoint.name.as_str()) {
                return Err(invalid(format!("duplicate endpoint name `{}`", endpoint.name)));
            }
            if endpoint.timeout_secs == 0 {
                return Err(invalid(format!(
                    "endpoint `{}`: timeout_secs must be at least 1",
                    endpoint.name
                )));
            }
        }
        Ok(())
    }
}

/// Replace each `${NAME}` that `lookup` resolves; leave the rest verbatim.
pub fn expand_placeholders<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(name: &str) -> Option<String> {
        match name {
            "HOOK_ID" => Some("123".into()),
            "HOOK_TOKEN" => Some("tok".into()),
            _ => None,
        }
    }

    #[test]
    fn test_expand_placeholders() {
        assert_eq!(
            expand_placeholders("https://discord.com/api/webhooks/${HOOK_ID}/${HOOK_TOKEN}", env),
            "https://discord.com/api/webhooks/123/tok"
        );
        assert_eq!(expand_placeholders("${MISSING}/x", env), "${MISSING}/x");
        assert_eq!(expand_placeholders("a${HOOK_ID", env), "a${HOOK_ID");
        assert_eq!(expand_placeholders("plain", env), "plain");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = MonitorConfig::from_toml_str("character_id = \"144\"", env).unwrap();
        assert_eq!(cfg.snapshot_dir, PathBuf::from(".sheetwatch/snapshots"));
        assert_eq!(cfg.retry, RetryPolicy::default());
        assert!(cfg.endpoints.is_empty());
        assert_eq!(cfg.notification, RouterConfig::default());
    }

    #[test]
    fn test_missing_character_id_is_config_error() {
        let err = MonitorConfig::from_toml_str("snapshot_dir = \"x\"", env).unwrap_err();
        assert_eq!(err.kind(), SwErrorKind::ConfigError);
    }

    #[test]
    fn test_preset_with_include_rejected() {
        let text = r#"
            character_id = "1"
            [filter]
            preset = "minimal"
            include = ["combat"]
        "#;
        let err = MonitorConfig::from_toml_str(text, env).unwrap_err();
        assert!(err.message().contains("cannot be combined"));
    }

    #[test]
    fn test_exclude_only_filter_includes_everything_else() {
        let f = FilterConfig {
            exclude: vec!["inventory.wealth".into()],
            ..FilterConfig::default()
        }
        .build(GroupCatalog::builtin())
        .unwrap();
        assert!(f.include_patterns().contains("combat.*"));
        assert!(f.exclude_patterns().contains("inventory.wealth.*"));
    }
}
