//! Change record types.
//!
//! A [`ChangeRecord`] is created once by a detector and is read-only from
//! then on. Causation and attribution are attached by consuming the record
//! and returning a new one; the identity (`field_path@timestamp`) never
//! changes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of difference between the old and new value of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Incremented,
    Decremented,
    Unchanged,
}

impl ChangeType {
    /// Classify a value change.
    ///
    /// Two numbers compare numerically; anything else is `Modified` unless
    /// the values are equal.
    pub fn classify(old: &Value, new: &Value) -> ChangeType {
        if let (Some(a), Some(b)) = (old.as_f64(), new.as_f64()) {
            return if b > a {
                ChangeType::Incremented
            } else if b < a {
                ChangeType::Decremented
            } else {
                ChangeType::Unchanged
            };
        }
        if old == new {
            ChangeType::Unchanged
        } else {
            ChangeType::Modified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Incremented => "incremented",
            ChangeType::Decremented => "decremented",
            ChangeType::Unchanged => "unchanged",
        }
    }
}

/// Domain category a change belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    BasicInfo,
    Abilities,
    Skills,
    Proficiencies,
    Combat,
    Spells,
    Inventory,
    Features,
    Appearance,
    Background,
    Meta,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::BasicInfo => "basic_info",
            ChangeCategory::Abilities => "abilities",
            ChangeCategory::Skills => "skills",
            ChangeCategory::Proficiencies => "proficiencies",
            ChangeCategory::Combat => "combat",
            ChangeCategory::Spells => "spells",
            ChangeCategory::Inventory => "inventory",
            ChangeCategory::Features => "features",
            ChangeCategory::Appearance => "appearance",
            ChangeCategory::Background => "background",
            ChangeCategory::Meta => "meta",
        }
    }

    /// Title used in notifications and summaries.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChangeCategory::BasicInfo => "Basic Info",
            ChangeCategory::Abilities => "Ability Scores",
            ChangeCategory::Skills => "Skills",
            ChangeCategory::Proficiencies => "Proficiencies",
            ChangeCategory::Combat => "Combat",
            ChangeCategory::Spells => "Spells",
            ChangeCategory::Inventory => "Inventory",
            ChangeCategory::Features => "Features & Traits",
            ChangeCategory::Appearance => "Appearance",
            ChangeCategory::Background => "Background",
            ChangeCategory::Meta => "Meta",
        }
    }
}

/// Notification priority. Ordered: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }

    /// Parse a priority name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Priority> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// Why a change happened, when it can be traced to another change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Causation {
    pub trigger: String,
    pub trigger_details: String,
    pub related_change_ids: Vec<String>,
    pub cascade_depth: u32,
}

/// Where an added element came from (class, species, feat, item...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub source: String,
    pub source_name: String,
    pub source_type: String,
}

/// One detected difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    field_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_value: Option<Value>,
    change_type: ChangeType,
    category: ChangeCategory,
    priority: Priority,
    description: String,
    detailed_description: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    causation: Option<Causation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    attribution: Option<Attribution>,
}

impl ChangeRecord {
    fn base(
        field_path: String,
        old_value: Option<Value>,
        new_value: Option<Value>,
        change_type: ChangeType,
        category: ChangeCategory,
        priority: Priority,
        timestamp: DateTime<Utc>,
    ) -> Self {
        debug_assert!(!field_path.is_empty(), "field_path must not be empty");
        Self {
            field_path,
            old_value,
            new_value,
            change_type,
            category,
            priority,
            description: String::new(),
            detailed_description: String::new(),
            timestamp,
            causation: None,
            attribution: None,
        }
    }

    /// A value that did not exist before.
    pub fn added(
        field_path: impl Into<String>,
        new_value: Value,
        category: ChangeCategory,
        priority: Priority,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::base(
            field_path.into(),
            None,
            Some(new_value),
            ChangeType::Added,
            category,
            priority,
            timestamp,
        )
    }

    /// A value that no longer exists.
    pub fn removed(
        field_path: impl Into<String>,
        old_value: Value,
        category: ChangeCategory,
        priority: Priority,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::base(
            field_path.into(),
            Some(old_value),
            None,
            ChangeType::Removed,
            category,
            priority,
            timestamp,
        )
    }

    /// A value present on both sides; the change type is classified from
    /// the two values.
    pub fn changed(
        field_path: impl Into<String>,
        old_value: Value,
        new_value: Value,
        category: ChangeCategory,
        priority: Priority,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let change_type = ChangeType::classify(&old_value, &new_value);
        Self::base(
            field_path.into(),
            Some(old_value),
            Some(new_value),
            change_type,
            category,
            priority,
            timestamp,
        )
    }

    /// Set the short and detailed descriptions.
    pub fn with_description(
        mut self,
        description: impl Into<String>,
        detailed_description: impl Into<String>,
    ) -> Self {
        self.description = description.into();
        self.detailed_description = detailed_description.into();
        self
    }

    /// Attach causation, returning the updated record.
    pub fn with_causation(mut self, causation: Causation) -> Self {
        self.causation = Some(causation);
        self
    }

    /// Attach attribution, returning the updated record.
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = Some(attribution);
        self
    }

    /// Stable identity: `field_path@timestamp`.
    pub fn change_id(&self) -> String {
        format!(
            "{}@{}",
            self.field_path,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }

    pub fn field_path(&self) -> &str {
        &self.field_path
    }

    pub fn old_value(&self) -> Option<&Value> {
        self.old_value.as_ref()
    }

    pub fn new_value(&self) -> Option<&Value> {
        self.new_value.as_ref()
    }

    pub fn change_type(&self) -> ChangeType {
        self.change_type
    }

    pub fn category(&self) -> ChangeCategory {
        self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn detailed_description(&self) -> &str {
        &self.detailed_description
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn causation(&self) -> Option<&Causation> {
        self.causation.as_ref()
    }

    pub fn attribution(&self) -> Option<&Attribution> {
        self.attribution.as_ref()
    }
}
