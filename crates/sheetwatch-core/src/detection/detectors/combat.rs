use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{child, humanize, DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "combat";

const FIELDS: &[(&str, &str, Priority)] = &[
    ("armor_class", "armor class", Priority::High),
    ("initiative", "initiative", Priority::Medium),
    ("proficiency_bonus", "proficiency bonus", Priority::High),
    ("passive_perception", "passive perception", Priority::Low),
];

const HIT_POINTS: &[(&str, &str, Priority)] = &[
    ("current", "current HP", Priority::Medium),
    ("maximum", "maximum HP", Priority::High),
    ("temporary", "temporary HP", Priority::Low),
];

const DEATH_SAVES: &[(&str, &str, Priority)] = &[
    ("successes", "death save successes", Priority::Medium),
    ("failures", "death save failures", Priority::High),
];

/// AC, initiative, speed, hit points, death saves and conditions.
#[derive(Debug, Default, Clone, Copy)]
pub struct CombatDetector;

impl ChangeDetector for CombatDetector {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Combat]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Combat, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::High, "combat stats")?
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

        // Either a single number or per-movement-mode object.
        em.tree(
            &format!("{}.speed", ROOT),
            child(Some(o), "speed"),
            child(Some(n), "speed"),
            &|_| Priority::Medium,
        );

        nested_scalars(&mut em, o, n, "hit_points", HIT_POINTS);
        nested_scalars(&mut em, o, n, "death_saves", DEATH_SAVES);

        em.string_set(
            &format!("{}.conditions", ROOT),
            child(Some(o), "conditions"),
            child(Some(n), "conditions"),
            "condition",
            Priority::Medium,
        )?;

        Ok(em.finish())
    }
}

fn nested_scalars(
    em: &mut Emitter,
    o: &Value,
    n: &Value,
    group: &str,
    fields: &[(&str, &str, Priority)],
) {
    let old_group = child(Some(o), group);
    let new_group = child(Some(n), group);
    for (key, label, priority) in fields {
        em.scalar(
            &format!("{}.{}.{}", ROOT, group, key),
            child(old_group, key),
            child(new_group, key),
            *priority,
            label,
        );
    }
    // Anything else under the group is reported at low priority.
    let known = |k: &str| fields.iter().any(|(f, _, _)| *f == k);
    let extra_keys: std::collections::BTreeSet<&String> = old_group
        .and_then(Value::as_object)
        .into_iter()
        .chain(new_group.and_then(Value::as_object))
        .flat_map(|m| m.keys())
        .filter(|k| !known(k.as_str()))
        .collect();
    for key in extra_keys {
        em.scalar(
            &format!("{}.{}.{}", ROOT, group, key),
            child(old_group, key),
            child(new_group, key),
            Priority::Low,
            &humanize(key),
        );
    }
}
