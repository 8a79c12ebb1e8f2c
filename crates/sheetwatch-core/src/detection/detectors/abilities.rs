use std::collections::BTreeSet;

use serde_json::{json, Value};

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{as_object, capitalize, child, DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "abilities";

/// Canonical ability order; unknown abilities follow alphabetically.
pub(crate) const ABILITIES: &[&str] = &[
    "strength",
    "dexterity",
    "constitution",
    "intelligence",
    "wisdom",
    "charisma",
];

const FIELDS: &[(&str, &str, Priority)] = &[
    ("score", "score", Priority::High),
    ("modifier", "modifier", Priority::Medium),
    ("save_proficient", "saving throw proficiency", Priority::Medium),
    ("save_modifier", "saving throw modifier", Priority::Low),
];

/// Ability scores, modifiers and saving throws.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbilityDetector;

impl ChangeDetector for AbilityDetector {
    fn name(&self) -> &'static str {
        "abilities"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Abilities]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Abilities, ctx.timestamp);
        let Some((o, n)) =
            owned_subtree(old, new, ROOT, &mut em, Priority::High, "ability scores")?
        else {
            return Ok(em.finish());
        };

        for ability in ordered_keys(o, n) {
            let path = format!("{}.{}", ROOT, ability);
            let old_ab = normalize(child(Some(o), &ability), &path)?;
            let new_ab = normalize(child(Some(n), &ability), &path)?;
            let name = capitalize(&ability);
            for (key, label, priority) in FIELDS {
                em.scalar(
                    &format!("{}.{}", path, key),
                    old_ab.as_ref().and_then(|v| child(Some(v), key)),
                    new_ab.as_ref().and_then(|v| child(Some(v), key)),
                    *priority,
                    &format!("{} {}", name, label),
                );
            }
        }

        Ok(em.finish())
    }
}

fn ordered_keys(o: &Value, n: &Value) -> Vec<String> {
    let present: BTreeSet<String> = o
        .as_object()
        .into_iter()
        .chain(n.as_object())
        .flat_map(|m| m.keys().cloned())
        .collect();
    let mut out: Vec<String> = ABILITIES
        .iter()
        .filter(|a| present.contains(**a))
        .map(|a| a.to_string())
        .collect();
    out.extend(
        present
            .into_iter()
            .filter(|k| !ABILITIES.contains(&k.as_str())),
    );
    out
}

/// A bare number is shorthand for `{"score": n}`.
fn normalize(value: Option<&Value>, path: &str) -> Result<Option<Value>, DetectionError> {
    match value {
        Some(Value::Number(n)) => Ok(Some(json!({ "score": n }))),
        other => Ok(as_object(other, path)?.map(|m| Value::Object(m.clone()))),
    }
}
