use super::catalog::{GroupCatalogBuilder, GroupDefinition};
use crate::detection::model::Priority;

/// Builder pre-loaded with the builtin groups.
pub fn builtin_builder() -> GroupCatalogBuilder {
    GroupCatalogBuilder::default()
        // core
        .core(GroupDefinition::new(
            "basic",
            "Name, level, experience, species and classes",
            Priority::High,
            &["character_info.*"],
        ))
        .core(GroupDefinition::new(
            "stats",
            "Ability scores, skills and proficiencies",
            Priority::Medium,
            &["abilities.*", "skills.*", "proficiencies.*"],
        ))
        .core(GroupDefinition::new(
            "combat",
            "Armor class, hit points, speed, conditions and death saves",
            Priority::High,
            &["combat.*"],
        ))
        .core(GroupDefinition::new(
            "spells",
            "Spellcasting stats, slots and known spells",
            Priority::Medium,
            &["spellcasting.*"],
        ))
        .core(GroupDefinition::new(
            "inventory",
            "Items, equipment and wealth",
            Priority::Medium,
            &["inventory.*"],
        ))
        .core(GroupDefinition::new(
            "features",
            "Class features, feats and species traits",
            Priority::Medium,
            &["features.*"],
        ))
        .core(GroupDefinition::new(
            "appearance",
            "Physical description",
            Priority::Low,
            &["appearance.*"],
        ))
        .core(GroupDefinition::new(
            "background",
            "Background and personality",
            Priority::Low,
            &["background.*"],
        ))
        .core(GroupDefinition::new(
            "meta",
            "Sheet metadata",
            Priority::Low,
            &["meta.*"],
        ))
        // nested
        .nested(
            "basic.identity",
            &[
                "character_info.name",
                "character_info.species",
                "character_info.subspecies",
                "character_info.alignment",
            ],
        )
        .nested(
            "basic.level",
            &["character_info.level", "character_info.experience_points"],
        )
        .nested("basic.classes", &["character_info.classes.*"])
        .nested("stats.abilities", &["abilities.*"])
        .nested(
            "stats.saves",
            &["abilities.*.save_proficient", "abilities.*.save_modifier"],
        )
        .nested("stats.skills", &["skills.*"])
        .nested("stats.proficiencies", &["proficiencies.*"])
        .nested("combat.hp", &["combat.hit_points.*"])
        .nested("combat.ac", &["combat.armor_class"])
        .nested("combat.movement", &["combat.speed", "combat.speed.*"])
        .nested("combat.conditions", &["combat.conditions.*"])
        .nested("combat.death_saves", &["combat.death_saves.*"])
        .nested(
            "combat.proficiency",
            &["combat.proficiency_bonus", "combat.initiative"],
        )
        .nested("spells.known", &["spellcasting.spells.*"])
        .nested(
            "spells.slots",
            &["spellcasting.spell_slots.*", "spellcasting.pact_slots.*"],
        )
        .nested(
            "spells.stats",
            &[
                "spellcasting.spell_save_dc",
                "spellcasting.spell_attack_bonus",
                "spellcasting.spellcasting_ability",
            ],
        )
        .nested("inventory.items", &["inventory.items.*"])
        .nested(
            "inventory.equipment",
            &["inventory.items.*.equipped", "inventory.items.*.attuned"],
        )
        .nested("inventory.wealth", &["inventory.wealth.*"])
        .nested("features.class", &["features.class_features.*"])
        .nested("features.feats", &["features.feats.*"])
        .nested("features.traits", &["features.racial_traits.*"])
        .nested(
            "background.story",
            &[
                "background.personality_traits",
                "background.ideals",
                "background.bonds",
                "background.flaws",
                "background.backstory",
            ],
        )
        // composite
        .composite(
            "progression",
            &["basic", "stats.abilities", "spells.known", "spells.slots"],
        )
        .composite(
            "combat_ready",
            &["combat", "spells.slots", "inventory.equipment"],
        )
        .composite("roleplay", &["background", "appearance", "basic.identity"])
        .composite("character_build", &["progression", "stats", "features"])
}
