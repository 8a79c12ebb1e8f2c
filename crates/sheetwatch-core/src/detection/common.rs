//! Shared comparison helpers for detectors.
//!
//! Detectors own one top-level subtree of the snapshot and describe their
//! priority tables declaratively; the [`Emitter`] turns pairs of values into
//! [`ChangeRecord`]s with consistent wording.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::detection::model::{Attribution, ChangeCategory, ChangeRecord, ChangeType, Priority};
use crate::errors::{SwError, SwErrorKind};

/// Failure inside a single detector. The engine isolates these.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectionError {
    #[error("expected {expected} at `{path}`, found {found}")]
    Malformed {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("element at `{path}` has neither `id` nor `name`")]
    MissingIdentity { path: String },

    #[error("detector `{detector}` panicked: {message}")]
    Panicked { detector: String, message: String },
}

impl DetectionError {
    pub fn path(&self) -> Option<&str> {
        match self {
            DetectionError::Malformed { path, .. } | DetectionError::MissingIdentity { path } => {
                Some(path)
            }
            DetectionError::Panicked { .. } => None,
        }
    }
}

impl From<DetectionError> for SwError {
    fn from(err: DetectionError) -> Self {
        let mut e = SwError::new(SwErrorKind::DetectionError).with_message(err.to_string());
        if let Some(path) = err.path() {
            e = e.with_field_path(path);
        }
        e
    }
}

/// JSON type name for error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Look up `key` in a snapshot object, treating JSON `null` as absent.
pub fn child<'a>(value: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    value
        .and_then(|v| v.get(key))
        .filter(|v| !v.is_null())
}

/// Require an object (or absence) at `path`.
pub fn as_object<'a>(
    value: Option<&'a Value>,
    path: &str,
) -> Result<Option<&'a Map<String, Value>>, DetectionError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(DetectionError::Malformed {
            path: path.to_string(),
            expected: "object",
            found: type_name(other),
        }),
    }
}

/// Require an array (or absence) at `path`.
pub fn as_array<'a>(
    value: Option<&'a Value>,
    path: &str,
) -> Result<&'a [Value], DetectionError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(other) => Err(DetectionError::Malformed {
            path: path.to_string(),
            expected: "array",
            found: type_name(other),
        }),
    }
}

/// Path segment for a key. `~` becomes `~0` and `.` becomes `~1`, so the
/// segment never splits and distinct keys never share a segment.
pub fn path_segment(key: &str) -> String {
    key.replace('~', "~0").replace('.', "~1")
}

/// Join a prefix and a segment.
pub fn join(prefix: &str, segment: &str) -> String {
    format!("{}.{}", prefix, segment)
}

/// Short, human form of a JSON value for descriptions.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => truncate(s, 80),
        Value::Object(map) => match map.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => truncate(&value.to_string(), 80),
        },
        Value::Array(_) => truncate(&value.to_string(), 80),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `snake_case` key to a label: `armor_class` -> `armor class`.
pub fn humanize(key: &str) -> String {
    key.replace('_', " ")
}

/// A field compared on every element of a keyed collection.
#[derive(Debug, Clone, Copy)]
pub struct TrackedField {
    pub key: &'static str,
    pub label: &'static str,
    pub priority: Priority,
}

/// How a keyed collection (spells, items, features...) is compared.
#[derive(Debug, Clone, Copy)]
pub struct CollectionSpec<'a> {
    /// Singular noun used in descriptions ("spell", "item").
    pub noun: &'a str,
    pub added: Priority,
    pub removed: Priority,
    pub tracked: &'a [TrackedField],
}

/// Accumulates records for one detector run.
pub struct Emitter {
    category: ChangeCategory,
    timestamp: DateTime<Utc>,
    records: Vec<ChangeRecord>,
}

impl Emitter {
    pub fn new(category: ChangeCategory, timestamp: DateTime<Utc>) -> Self {
        Self {
            category,
            timestamp,
            records: Vec::new(),
        }
    }

    /// Records of a different category emitted by the same detector.
    pub fn set_category(&mut self, category: ChangeCategory) {
        self.category = category;
    }

    pub fn finish(self) -> Vec<ChangeRecord> {
        self.records
    }

    pub fn push(&mut self, record: ChangeRecord) {
        self.records.push(record);
    }

    /// Compare one scalar field. Absent and `null` are the same thing.
    pub fn scalar(
        &mut self,
        path: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        priority: Priority,
        label: &str,
    ) {
        let old = old.filter(|v| !v.is_null());
        let new = new.filter(|v| !v.is_null());
        let label = capitalize(label);
        match (old, new) {
            (None, None) => {}
            (None, Some(n)) => {
                let short = format!("{} set to {}", label, display_value(n));
                let detailed = format!("{} (`{}` was unset, now {})", short, path, n);
                self.records.push(
                    ChangeRecord::added(path, n.clone(), self.category, priority, self.timestamp)
                        .with_description(short, detailed),
                );
            }
            (Some(o), None) => {
                let short = format!("{} cleared (was {})", label, display_value(o));
                let detailed = format!("{} (`{}` was {}, now unset)", short, path, o);
                self.records.push(
                    ChangeRecord::removed(path, o.clone(), self.category, priority, self.timestamp)
                        .with_description(short, detailed),
                );
            }
            (Some(o), Some(n)) => {
                let change_type = ChangeType::classify(o, n);
                let verb = match change_type {
                    ChangeType::Unchanged => return,
                    ChangeType::Incremented => "increased",
                    ChangeType::Decremented => "decreased",
                    _ => "changed",
                };
                let short = format!(
                    "{} {} from {} to {}",
                    label,
                    verb,
                    display_value(o),
                    display_value(n)
                );
                let detailed = format!("{} (`{}`: {} -> {})", short, path, o, n);
                self.records.push(
                    ChangeRecord::changed(
                        path,
                        o.clone(),
                        n.clone(),
                        self.category,
                        priority,
                        self.timestamp,
                    )
                    .with_description(short, detailed),
                );
            }
        }
    }

    /// Compare a value tree: objects recurse by key, everything else is a
    /// leaf. `priority_for` picks the priority from the leaf's key.
    pub fn tree(
        &mut self,
        path: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        priority_for: &dyn Fn(&str) -> Priority,
    ) {
        let old = old.filter(|v| !v.is_null());
        let new = new.filter(|v| !v.is_null());
        match (old, new) {
            (Some(Value::Object(o)), Some(Value::Object(n))) => {
                let keys: BTreeSet<&String> = o.keys().chain(n.keys()).collect();
                for key in keys {
                    let sub = join(path, &path_segment(key));
                    self.tree(&sub, o.get(key), n.get(key), priority_for);
                }
            }
            _ => {
                let leaf = path.rsplit('.').next().unwrap_or(path);
                self.scalar(path, old, new, priority_for(leaf), &humanize(leaf));
            }
        }
    }

    /// Record a whole subtree appearing or disappearing.
    pub fn subtree_presence(
        &mut self,
        path: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        priority: Priority,
        label: &str,
    ) {
        match (old, new) {
            (None, Some(n)) => {
                let short = format!("{} added", capitalize(label));
                let detailed = format!("{} (`{}` appeared)", short, path);
                self.records.push(
                    ChangeRecord::added(path, n.clone(), self.category, priority, self.timestamp)
                        .with_description(short, detailed),
                );
            }
            (Some(o), None) => {
                let short = format!("{} removed", capitalize(label));
                let detailed = format!("{} (`{}` disappeared)", short, path);
                self.records.push(
                    ChangeRecord::removed(path, o.clone(), self.category, priority, self.timestamp)
                        .with_description(short, detailed),
                );
            }
            _ => {}
        }
    }

    /// Compare a keyed collection. Elements are matched by `id`, then
    /// `name`; plain strings are their own key.
    pub fn collection(
        &mut self,
        path: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        spec: CollectionSpec<'_>,
    ) -> Result<(), DetectionError> {
        let old_items = keyed_elements(as_array(old, path)?, path)?;
        let new_items = keyed_elements(as_array(new, path)?, path)?;

        for (key, element) in &new_items {
            if find(&old_items, key).is_some() {
                continue;
            }
            let item_path = join(path, key);
            let name = element_name(element, key);
            let short = format!("Added {}: {}", spec.noun, name);
            let detailed = match element_source(element) {
                Some(src) => format!("{} (from {} {})", short, src.source_type, src.source_name),
                None => short.clone(),
            };
            let mut record = ChangeRecord::added(
                item_path,
                (*element).clone(),
                self.category,
                spec.added,
                self.timestamp,
            )
            .with_description(short, detailed);
            if let Some(attribution) = element_source(element) {
                record = record.with_attribution(attribution);
            }
            self.records.push(record);
        }

        for (key, element) in &old_items {
            if find(&new_items, key).is_some() {
                continue;
            }
            let item_path = join(path, key);
            let name = element_name(element, key);
            let short = format!("Removed {}: {}", spec.noun, name);
            self.records.push(
                ChangeRecord::removed(
                    item_path.clone(),
                    (*element).clone(),
                    self.category,
                    spec.removed,
                    self.timestamp,
                )
                .with_description(short.clone(), format!("{} (`{}`)", short, item_path)),
            );
        }

        for (key, new_element) in &new_items {
            let Some(old_element) = find(&old_items, key) else {
                continue;
            };
            let item_path = join(path, key);
            let name = element_name(new_element, key);
            for field in spec.tracked {
                self.scalar(
                    &join(&item_path, field.key),
                    old_element.get(field.key),
                    new_element.get(field.key),
                    field.priority,
                    &format!("{} {}", name, field.label),
                );
            }
        }

        Ok(())
    }

    /// Compare a list of plain strings (languages, conditions).
    pub fn string_set(
        &mut self,
        path: &str,
        old: Option<&Value>,
        new: Option<&Value>,
        noun: &str,
        priority: Priority,
    ) -> Result<(), DetectionError> {
        self.collection(
            path,
            old,
            new,
            CollectionSpec {
                noun,
                added: priority,
                removed: priority,
                tracked: &[],
            },
        )
    }
}

fn find<'a>(items: &'a [(String, &'a Value)], key: &str) -> Option<&'a Value> {
    items.iter().find(|(k, _)| k == key).map(|(_, v)| *v)
}

/// Path segment of every element, in document order. Elements with the same
/// identity are duplicates and only the first is kept. Distinct identities
/// that render to the same segment (`1` and `"1"`) get a `#n` suffix.
fn keyed_elements<'a>(
    items: &'a [Value],
    path: &str,
) -> Result<Vec<(String, &'a Value)>, DetectionError> {
    let mut identities = BTreeSet::new();
    let mut segments = BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let identity = identity_key(item).ok_or_else(|| DetectionError::MissingIdentity {
            path: format!("{}[{}]", path, idx),
        })?;
        if !identities.insert(identity.clone()) {
            continue;
        }
        let base = path_segment(identity.text());
        let mut segment = base.clone();
        let mut n = 2;
        while !segments.insert(segment.clone()) {
            segment = format!("{}#{}", base, n);
            n += 1;
        }
        out.push((segment, item));
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Identity {
    Text(String),
    Number(String),
}

impl Identity {
    fn text(&self) -> &str {
        match self {
            Identity::Text(s) | Identity::Number(s) => s,
        }
    }
}

fn identity_key(item: &Value) -> Option<Identity> {
    match item {
        Value::String(s) => Some(Identity::Text(s.clone())),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(s)) => Some(Identity::Text(s.clone())),
            Some(Value::Number(n)) => Some(Identity::Number(n.to_string())),
            _ => map
                .get("name")
                .and_then(Value::as_str)
                .map(|s| Identity::Text(s.to_string())),
        },
        _ => None,
    }
}

fn element_name(element: &Value, key: &str) -> String {
    element
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(key)
        .to_string()
}

/// Attribution from an element's `source` / `source_name` / `source_type`.
pub fn element_source(element: &Value) -> Option<Attribution> {
    let source = element.get("source").and_then(Value::as_str)?;
    let source_name = element
        .get("source_name")
        .and_then(Value::as_str)
        .unwrap_or(source);
    let source_type = element
        .get("source_type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    Some(Attribution {
        source: source.to_string(),
        source_name: source_name.to_string(),
        source_type: source_type.to_string(),
    })
}
