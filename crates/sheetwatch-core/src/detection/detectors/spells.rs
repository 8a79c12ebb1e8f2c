use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{
    child, type_name, CollectionSpec, DetectionError, Emitter, TrackedField,
};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "spellcasting";

const FIELDS: &[(&str, &str, Priority)] = &[
    ("spellcasting_ability", "spellcasting ability", Priority::Medium),
    ("spell_save_dc", "spell save DC", Priority::Medium),
    ("spell_attack_bonus", "spell attack bonus", Priority::Medium),
];

const SPELL_FIELDS: &[TrackedField] = &[TrackedField {
    key: "prepared",
    label: "prepared",
    priority: Priority::Low,
}];

/// Slot capacity and usage for one spell level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotTier {
    pub max: u64,
    pub used: u64,
}

/// Spellcasting stats, spell slots, pact slots and the spell list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpellDetector;

impl ChangeDetector for SpellDetector {
    fn name(&self) -> &'static str {
        "spells"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Spells]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Spells, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::High, "spellcasting")?
        else {
            return Ok(em.finish());
        };

        for (key, label, priority) in FIELDS {
            em.scalar(
                &format!("{}.{}", ROOT, key),
                child(Some(o), key),
                child(Some(n), key),
                *priority,
                label,
            );
        }

        compare_tiers(&mut em, o, n, "spell_slots", "spell slots")?;
        compare_tiers(&mut em, o, n, "pact_slots", "pact slots")?;

        em.collection(
            &format!("{}.spells", ROOT),
            child(Some(o), "spells"),
            child(Some(n), "spells"),
            CollectionSpec {
                noun: "spell",
                added: Priority::Medium,
                removed: Priority::Medium,
                tracked: SPELL_FIELDS,
            },
        )?;

        Ok(em.finish())
    }
}

fn compare_tiers(
    em: &mut Emitter,
    o: &Value,
    n: &Value,
    key: &str,
    noun: &str,
) -> Result<(), DetectionError> {
    let path = format!("{}.{}", ROOT, key);
    let old_tiers = normalize_tiers(child(Some(o), key), &path)?;
    let new_tiers = normalize_tiers(child(Some(n), key), &path)?;

    let tiers: BTreeSet<u32> = old_tiers.keys().chain(new_tiers.keys()).copied().collect();
    for tier in tiers {
        let before = old_tiers.get(&tier).copied().unwrap_or_default();
        let after = new_tiers.get(&tier).copied().unwrap_or_default();
        // A tier with no capacity on either side is the same as no tier.
        if before.max == 0 && after.max == 0 {
            continue;
        }
        let tier_path = format!("{}.{}", path, tier);
        em.scalar(
            &format!("{}.max", tier_path),
            Some(&json!(before.max)),
            Some(&json!(after.max)),
            Priority::High,
            &format!("level {} {}", tier, noun),
        );
        em.scalar(
            &format!("{}.used", tier_path),
            Some(&json!(before.used)),
            Some(&json!(after.used)),
            Priority::Low,
            &format!("level {} {} used", tier, noun),
        );
    }
    Ok(())
}

/// Normalize any supported slot encoding into `tier -> {max, used}`.
///
/// Accepted shapes:
/// - array of objects with `level` (tier taken from `level`)
/// - array of objects without `level` (tier is the array index)
/// - array of integers (tier is the index, value is the capacity)
/// - object keyed by tier number (`"3"` or `"level_3"`), values either a
///   capacity or an object
///
/// Capacity comes from `max` (or `total`), usage from `used` (or
/// `expended`); missing values count as zero.
///
/// # Errors
///
/// Returns [`DetectionError::Malformed`] for any other shape.
pub fn normalize_tiers(
    value: Option<&Value>,
    path: &str,
) -> Result<BTreeMap<u32, SlotTier>, DetectionError> {
    let mut tiers = BTreeMap::new();
    match value {
        None | Some(Value::Null) => {}
        Some(Value::Array(items)) => {
            for (idx, item) in items.iter().enumerate() {
                let slot = match item {
                    Value::Null => continue,
                    Value::Number(_) => SlotTier {
                        max: count(Some(item)),
                        used: 0,
                    },
                    Value::Object(_) => tier_object(item),
                    other => {
                        return Err(DetectionError::Malformed {
                            path: format!("{}[{}]", path, idx),
                            expected: "slot count or object",
                            found: type_name(other),
                        })
                    }
                };
                let tier = array_tier(item, idx, path)?;
                tiers.insert(tier, slot);
            }
        }
        Some(Value::Object(map)) => {
            for (key, item) in map {
                let tier = key
                    .trim_start_matches("level_")
                    .parse::<u32>()
                    .map_err(|_| DetectionError::Malformed {
                        path: format!("{}.{}", path, key),
                        expected: "numeric tier key",
                        found: "string",
                    })?;
                let slot = match item {
                    Value::Null => continue,
                    Value::Number(_) => SlotTier {
                        max: count(Some(item)),
                        used: 0,
                    },
                    Value::Object(_) => tier_object(item),
                    other => {
                        return Err(DetectionError::Malformed {
                            path: format!("{}.{}", path, key),
                            expected: "slot count or object",
                            found: type_name(other),
                        })
                    }
                };
                tiers.insert(tier, slot);
            }
        }
        Some(other) => {
            return Err(DetectionError::Malformed {
                path: path.to_string(),
                expected: "array or object",
                found: type_name(other),
            })
        }
    }
    Ok(tiers)
}

/// Tier of an array element: its `level`, else its index. Either must fit
/// in a `u32`.
fn array_tier(item: &Value, idx: usize, path: &str) -> Result<u32, DetectionError> {
    let malformed = |found: &'static str| DetectionError::Malformed {
        path: format!("{}[{}]", path, idx),
        expected: "tier number",
        found,
    };
    match item.get("level") {
        None | Some(Value::Null) => u32::try_from(idx).map_err(|_| malformed("index out of range")),
        Some(level) => level
            .as_u64()
            .and_then(|l| u32::try_from(l).ok())
            .ok_or_else(|| malformed(type_name(level))),
    }
}

fn tier_object(item: &Value) -> SlotTier {
    SlotTier {
        max: count(item.get("max").or_else(|| item.get("total"))),
        used: count(item.get("used").or_else(|| item.get("expended"))),
    }
}

fn count(value: Option<&Value>) -> u64 {
    value
        .and_then(Value::as_f64)
        .filter(|v| *v > 0.0)
        .map(|v| v.round() as u64)
        .unwrap_or(0)
}
