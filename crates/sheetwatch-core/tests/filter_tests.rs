#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use proptest::prelude::*;
use serde_json::json;
use sheetwatch_core::groups::presets;
use sheetwatch_core::{ChangeCategory, ChangeFilter, ChangeRecord, GroupCatalog, Priority};

fn record(path: &str) -> ChangeRecord {
    ChangeRecord::changed(
        path,
        json!(1),
        json!(2),
        ChangeCategory::Meta,
        Priority::Medium,
        Utc::now(),
    )
}

// ----------------------------------------------------------------------------
// Resolution
// ----------------------------------------------------------------------------

#[test]
fn test_composite_resolves_like_its_members() {
    let catalog = GroupCatalog::builtin();
    let composite = catalog.resolve(&["progression"]);
    let expanded = catalog.resolve(&["basic", "stats.abilities", "spells.known", "spells.slots"]);
    assert_eq!(composite, expanded);
    assert!(composite.unknown.is_empty());
}

#[test]
fn test_nested_composite_resolution() {
    let catalog = GroupCatalog::builtin();
    let build = catalog.resolve(&["character_build"]);
    let expanded = catalog.resolve(&[
        "basic",
        "stats.abilities",
        "spells.known",
        "spells.slots",
        "stats",
        "features",
    ]);
    assert_eq!(build, expanded);
}

#[test]
fn test_star_is_union_of_core_groups() {
    let catalog = GroupCatalog::builtin();
    let star = catalog.resolve(&["*"]);
    let names: Vec<String> = catalog.core_groups().map(|g| g.name.clone()).collect();
    assert_eq!(star, catalog.resolve(&names[..]));
    assert_eq!(names.len(), 9);
}

#[test]
fn test_unknown_groups_resolve_to_nothing() {
    let r = GroupCatalog::builtin().resolve(&["not_a_group"]);
    assert!(r.patterns.is_empty());
    assert_eq!(r.unknown, vec!["not_a_group"]);
}

// ----------------------------------------------------------------------------
// Keep / drop
// ----------------------------------------------------------------------------

#[test]
fn test_exclude_wins_over_include() {
    let f = ChangeFilter::new(GroupCatalog::builtin(), &["inventory"], &["inventory.wealth"]);
    assert!(!f.should_keep(&record("inventory.wealth.gold")));
    assert!(f.should_keep(&record("inventory.items.itm-1.equipped")));
}

#[test]
fn test_empty_lists_keep_everything() {
    let f = ChangeFilter::new(GroupCatalog::builtin(), &[] as &[&str], &[] as &[&str]);
    for path in ["character_info.level", "meta.campaign", "whatever"] {
        assert!(f.should_keep(&record(path)));
    }
}

#[test]
fn test_equipment_group_only_matches_equip_fields() {
    let f = ChangeFilter::new(GroupCatalog::builtin(), &["inventory.equipment"], &[] as &[&str]);
    assert!(f.should_keep(&record("inventory.items.itm-1.equipped")));
    assert!(f.should_keep(&record("inventory.items.itm-1.attuned")));
    assert!(!f.should_keep(&record("inventory.items.itm-1.quantity")));
}

#[test]
fn test_quiet_preset() {
    let f = ChangeFilter::from_preset(GroupCatalog::builtin(), "quiet").unwrap();
    assert!(f.should_keep(&record("combat.armor_class")));
    assert!(!f.should_keep(&record("combat.death_saves.failures")));
    assert!(!f.should_keep(&record("appearance.hair")));
    assert!(!f.should_keep(&record("inventory.wealth.gold")));
}

#[test]
fn test_every_preset_builds() {
    for p in presets::presets() {
        let f = ChangeFilter::from_preset(GroupCatalog::builtin(), p.name).unwrap();
        assert!(f.unknown_groups().is_empty(), "{}", p.name);
    }
}

// ----------------------------------------------------------------------------
// Order independence
// ----------------------------------------------------------------------------

const PATHS: &[&str] = &[
    "character_info.level",
    "abilities.strength.score",
    "abilities.wisdom.save_proficient",
    "skills.arcana.modifier",
    "combat.hit_points.current",
    "combat.death_saves.failures",
    "spellcasting.spell_slots.3.max",
    "spellcasting.spells.Fireball",
    "inventory.items.itm-1.equipped",
    "inventory.wealth.gold",
    "features.feats.Lucky",
    "appearance.hair",
    "background.backstory",
];

const GROUPS: &[&str] = &[
    "basic",
    "stats",
    "stats.saves",
    "combat",
    "combat.hp",
    "spells.slots",
    "inventory.wealth",
    "inventory.equipment",
    "roleplay",
    "progression",
    "combat_ready",
];

proptest! {
    #[test]
    fn prop_filter_is_order_independent(
        picks in prop::collection::vec(0..PATHS.len(), 0..30),
        include in prop::collection::vec(0..GROUPS.len(), 0..4),
        exclude in prop::collection::vec(0..GROUPS.len(), 0..3),
    ) {
        let inc: Vec<&str> = include.iter().map(|i| GROUPS[*i]).collect();
        let exc: Vec<&str> = exclude.iter().map(|i| GROUPS[*i]).collect();
        let filter = ChangeFilter::new(GroupCatalog::builtin(), &inc[..], &exc[..]);

        let records: Vec<ChangeRecord> = picks.iter().map(|i| record(PATHS[*i])).collect();
        let forward: Vec<String> = filter
            .filter(records.clone())
            .iter()
            .map(|r| r.field_path().to_string())
            .collect();

        let mut reversed = records;
        reversed.reverse();
        let mut backward: Vec<String> = filter
            .filter(reversed)
            .iter()
            .map(|r| r.field_path().to_string())
            .collect();
        backward.reverse();

        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_exclude_always_wins(idx in 0..PATHS.len()) {
        let path = PATHS[idx];
        let filter = ChangeFilter::from_patterns(
            vec!["*".to_string()],
            vec![path.to_string()],
        );
        prop_assert!(!filter.should_keep(&record(path)));
    }
}
