//! Causation analysis: links derived changes to the change that caused them.
//!
//! Three triggers are recognised:
//! - `level_up`: character or class level increased; links maximum HP,
//!   proficiency bonus, spell slots, new class features, new spells and
//!   ability score improvements
//! - `ability_score_change`: links that ability's modifier and save, its
//!   skills, initiative (dexterity), maximum HP (constitution) and spell
//!   save DC / attack bonus
//! - `equipment_change`: links armor class and speed to equip, attune,
//!   add and remove of items
//!
//! Records that already carry causation are left alone. Cascade depth is
//! the trigger's own depth plus one.

use std::collections::BTreeMap;

use crate::detection::model::{Causation, ChangeRecord, ChangeType};

/// Skill to governing ability.
const SKILL_ABILITIES: &[(&str, &str)] = &[
    ("acrobatics", "dexterity"),
    ("animal_handling", "wisdom"),
    ("arcana", "intelligence"),
    ("athletics", "strength"),
    ("deception", "charisma"),
    ("history", "intelligence"),
    ("insight", "wisdom"),
    ("intimidation", "charisma"),
    ("investigation", "intelligence"),
    ("medicine", "wisdom"),
    ("nature", "intelligence"),
    ("perception", "wisdom"),
    ("performance", "charisma"),
    ("persuasion", "charisma"),
    ("religion", "intelligence"),
    ("sleight_of_hand", "dexterity"),
    ("stealth", "dexterity"),
    ("survival", "wisdom"),
];

const CASTING_ABILITIES: &[&str] = &["intelligence", "wisdom", "charisma"];

#[derive(Debug, Clone)]
struct Trigger {
    kind: &'static str,
    details: String,
    ids: Vec<String>,
    depth: u32,
}

impl Trigger {
    fn causation(&self) -> Causation {
        Causation {
            trigger: self.kind.to_string(),
            trigger_details: self.details.clone(),
            related_change_ids: self.ids.clone(),
            cascade_depth: self.depth + 1,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CausationAnalyzer;

impl CausationAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Attach causation to derived records. Order and count are preserved.
    pub fn analyze(&self, records: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
        let records = match level_trigger(&records) {
            Some(trigger) => records
                .into_iter()
                .map(|r| {
                    if r.causation().is_none() && !is_level_path(&r) && follows_level_up(&r) {
                        r.with_causation(trigger.causation())
                    } else {
                        r
                    }
                })
                .collect(),
            None => records,
        };

        let abilities = ability_triggers(&records);
        let equipment = equipment_trigger(&records);
        if abilities.is_empty() && equipment.is_none() {
            return records;
        }

        records
            .into_iter()
            .map(|r| {
                if r.causation().is_some() {
                    return r;
                }
                if let Some(trigger) = ability_cause(&r, &abilities) {
                    let causation = trigger.causation();
                    return r.with_causation(causation);
                }
                if let Some(trigger) = equipment.as_ref().filter(|_| follows_equipment(&r)) {
                    return r.with_causation(trigger.causation());
                }
                r
            })
            .collect()
    }
}

fn is_level_path(r: &ChangeRecord) -> bool {
    let path = r.field_path();
    path == "character_info.level"
        || (path.starts_with("character_info.classes.") && path.ends_with(".level"))
}

fn level_trigger(records: &[ChangeRecord]) -> Option<Trigger> {
    let levels: Vec<&ChangeRecord> = records
        .iter()
        .filter(|r| is_level_path(r) && r.change_type() == ChangeType::Incremented)
        .collect();
    let first = levels.first()?;
    let details = match (first.old_value(), first.new_value()) {
        (Some(o), Some(n)) => format!("Level {} -> {}", o, n),
        _ => "Level increased".to_string(),
    };
    Some(Trigger {
        kind: "level_up",
        details,
        ids: levels.iter().map(|r| r.change_id()).collect(),
        depth: 0,
    })
}

fn follows_level_up(r: &ChangeRecord) -> bool {
    let path = r.field_path();
    let added = r.change_type() == ChangeType::Added;
    path == "combat.hit_points.maximum"
        || path == "combat.proficiency_bonus"
        || path.starts_with("spellcasting.spell_slots.")
        || path.starts_with("spellcasting.pact_slots.")
        || (added && path.starts_with("features.class_features."))
        || (added && path.starts_with("spellcasting.spells."))
        || (r.change_type() == ChangeType::Incremented && ability_of_score(path).is_some())
}

/// `abilities.<name>.score` -> `<name>`.
fn ability_of_score(path: &str) -> Option<&str> {
    path.strip_prefix("abilities.")?.strip_suffix(".score")
}

fn ability_triggers(records: &[ChangeRecord]) -> BTreeMap<String, Trigger> {
    let mut out = BTreeMap::new();
    for r in records {
        let Some(ability) = ability_of_score(r.field_path()) else {
            continue;
        };
        if !matches!(
            r.change_type(),
            ChangeType::Incremented | ChangeType::Decremented
        ) {
            continue;
        }
        let details = match (r.old_value(), r.new_value()) {
            (Some(o), Some(n)) => format!("{} {} -> {}", ability, o, n),
            _ => format!("{} changed", ability),
        };
        out.entry(ability.to_string()).or_insert(Trigger {
            kind: "ability_score_change",
            details,
            ids: vec![r.change_id()],
            depth: r.causation().map(|c| c.cascade_depth).unwrap_or(0),
        });
    }
    out
}

fn ability_cause<'a>(
    r: &ChangeRecord,
    abilities: &'a BTreeMap<String, Trigger>,
) -> Option<&'a Trigger> {
    let path = r.field_path();

    if let Some(rest) = path.strip_prefix("abilities.") {
        let (ability, field) = rest.split_once('.')?;
        if matches!(field, "modifier" | "save_modifier") {
            return abilities.get(ability);
        }
        return None;
    }

    if let Some(rest) = path.strip_prefix("skills.") {
        let (skill, field) = rest.split_once('.')?;
        if field != "modifier" {
            return None;
        }
        let ability = SKILL_ABILITIES
            .iter()
            .find(|(s, _)| *s == skill)
            .map(|(_, a)| *a)?;
        return abilities.get(ability);
    }

    match path {
        "combat.initiative" => abilities.get("dexterity"),
        "combat.hit_points.maximum" => abilities.get("constitution"),
        "spellcasting.spell_save_dc" | "spellcasting.spell_attack_bonus" => CASTING_ABILITIES
            .iter()
            .find_map(|a| abilities.get(*a)),
        _ => None,
    }
}

fn is_equipment_change(r: &ChangeRecord) -> bool {
    let Some(rest) = r.field_path().strip_prefix("inventory.items.") else {
        return false;
    };
    match rest.rsplit_once('.') {
        Some((_, field)) => matches!(field, "equipped" | "attuned"),
        None => matches!(r.change_type(), ChangeType::Added | ChangeType::Removed),
    }
}

fn equipment_trigger(records: &[ChangeRecord]) -> Option<Trigger> {
    let changes: Vec<&ChangeRecord> = records.iter().filter(|r| is_equipment_change(r)).collect();
    let first = changes.first()?;
    let details = if changes.len() == 1 {
        first.description().to_string()
    } else {
        format!("{} equipment changes", changes.len())
    };
    Some(Trigger {
        kind: "equipment_change",
        details,
        ids: changes.iter().map(|r| r.change_id()).collect(),
        depth: 0,
    })
}

fn follows_equipment(r: &ChangeRecord) -> bool {
    let path = r.field_path();
    path == "combat.armor_class" || path == "combat.speed" || path.starts_with("combat.speed.")
}
