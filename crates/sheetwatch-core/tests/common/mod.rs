use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sheetwatch_core::{DetectionContext, DetectionEngine, OperationLog};

/// Engine with every built-in detector and a private operation log.
#[allow(dead_code)]
pub fn engine() -> DetectionEngine {
    DetectionEngine::with_default_detectors(Arc::new(OperationLog::new()))
}

/// Fixed-timestamp context so change ids are reproducible.
#[allow(dead_code)]
pub fn ctx() -> DetectionContext {
    let ts: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-05-01T18:30:00Z")
        .unwrap()
        .with_timezone(&Utc);
    DetectionContext::new("char-1001")
        .with_character_name("Vex")
        .with_timestamp(ts)
}

/// A level 4 wizard sheet touching every detector subtree.
#[allow(dead_code)]
pub fn wizard_level_4() -> Value {
    json!({
        "character_info": {
            "name": "Vex",
            "level": 4,
            "experience_points": 2700,
            "species": "High Elf",
            "alignment": "Chaotic Good",
            "inspiration": false,
            "classes": [{"name": "Wizard", "level": 4, "subclass": "Evocation"}]
        },
        "abilities": {
            "strength": {"score": 8, "modifier": -1, "save_proficient": false},
            "dexterity": {"score": 14, "modifier": 2, "save_proficient": false},
            "constitution": {"score": 14, "modifier": 2, "save_proficient": false},
            "intelligence": {"score": 18, "modifier": 4, "save_proficient": true},
            "wisdom": {"score": 12, "modifier": 1, "save_proficient": true},
            "charisma": {"score": 10, "modifier": 0, "save_proficient": false}
        },
        "skills": {
            "arcana": {"proficient": true, "expertise": false, "modifier": 6},
            "history": {"proficient": true, "expertise": false, "modifier": 6},
            "stealth": {"proficient": false, "expertise": false, "modifier": 2}
        },
        "proficiencies": {
            "languages": ["Common", "Elvish", "Draconic"],
            "tools": [],
            "armor": [],
            "weapons": ["Dagger", "Quarterstaff", "Longsword"]
        },
        "combat": {
            "armor_class": 12,
            "initiative": 2,
            "speed": 30,
            "proficiency_bonus": 2,
            "hit_points": {"current": 32, "maximum": 32, "temporary": 0},
            "death_saves": {"successes": 0, "failures": 0},
            "conditions": []
        },
        "spellcasting": {
            "spellcasting_ability": "intelligence",
            "spell_save_dc": 14,
            "spell_attack_bonus": 6,
            "spell_slots": [0, 4, 3],
            "spells": [
                {"name": "Fire Bolt", "level": 0, "source": "Wizard", "source_type": "class"},
                {"name": "Shield", "level": 1, "prepared": true},
                {"name": "Misty Step", "level": 2, "prepared": false}
            ]
        },
        "inventory": {
            "items": [
                {"id": "itm-1", "name": "Quarterstaff", "quantity": 1, "equipped": true},
                {"id": "itm-2", "name": "Spellbook", "quantity": 1},
                {"id": "itm-3", "name": "Potion of Healing", "quantity": 2}
            ],
            "wealth": {"copper": 12, "silver": 30, "electrum": 0, "gold": 145, "platinum": 0}
        },
        "features": {
            "class_features": [{"name": "Arcane Recovery", "source": "Wizard", "source_type": "class"}],
            "feats": [],
            "racial_traits": [{"name": "Darkvision", "source": "High Elf", "source_type": "species"}]
        },
        "appearance": {"age": 112, "height": "5'9\"", "eyes": "violet", "hair": "silver"},
        "background": {
            "name": "Sage",
            "personality_traits": "Always has a book open.",
            "ideals": "Knowledge",
            "bonds": "The library of Candlekeep",
            "flaws": "Easily distracted",
            "backstory": "Raised among scholars."
        },
        "meta": {"campaign": "Ashes of Thay", "is_active": true}
    })
}

/// `wizard_level_4` after reaching level 5.
#[allow(dead_code)]
pub fn wizard_level_5() -> Value {
    let mut sheet = wizard_level_4();
    sheet["character_info"]["level"] = json!(5);
    sheet["character_info"]["experience_points"] = json!(6500);
    sheet["character_info"]["classes"][0]["level"] = json!(5);
    sheet["combat"]["hit_points"]["maximum"] = json!(38);
    sheet["combat"]["hit_points"]["current"] = json!(38);
    sheet["combat"]["proficiency_bonus"] = json!(3);
    sheet["spellcasting"]["spell_slots"] = json!([0, 4, 3, 2]);
    sheet["spellcasting"]["spell_save_dc"] = json!(15);
    sheet["spellcasting"]["spell_attack_bonus"] = json!(7);
    sheet["spellcasting"]["spells"]
        .as_array_mut()
        .unwrap()
        .push(json!({"name": "Fireball", "level": 3, "source": "Wizard", "source_type": "class"}));
    sheet
}
