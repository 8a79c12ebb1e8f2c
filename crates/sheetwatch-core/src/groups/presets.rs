//! Named filter presets.

/// A static include/exclude pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPreset {
    pub name: &'static str,
    pub description: &'static str,
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

const PRESETS: &[FilterPreset] = &[
    FilterPreset {
        name: "full",
        description: "Every change",
        include: &["*"],
        exclude: &[],
    },
    FilterPreset {
        name: "minimal",
        description: "Level, identity and hit points only",
        include: &["basic", "combat.hp"],
        exclude: &[],
    },
    FilterPreset {
        name: "combat_only",
        description: "What matters mid-fight",
        include: &["combat", "spells.slots", "inventory.equipment"],
        exclude: &[],
    },
    FilterPreset {
        name: "roleplay_session",
        description: "Story and appearance",
        include: &["background", "appearance"],
        exclude: &[],
    },
    FilterPreset {
        name: "progression_only",
        description: "Character advancement",
        include: &["progression"],
        exclude: &[],
    },
    FilterPreset {
        name: "no_wealth",
        description: "Everything except coin counts",
        include: &["*"],
        exclude: &["inventory.wealth"],
    },
    FilterPreset {
        name: "quiet",
        description: "Everything except low-signal churn",
        include: &["*"],
        exclude: &[
            "appearance",
            "background",
            "inventory.wealth",
            "combat.death_saves",
        ],
    },
];

pub fn presets() -> &'static [FilterPreset] {
    PRESETS
}

pub fn preset(name: &str) -> Option<&'static FilterPreset> {
    PRESETS.iter().find(|p| p.name == name)
}
