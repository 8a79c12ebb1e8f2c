use std::collections::BTreeSet;

use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{as_object, capitalize, child, humanize, DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "skills";

const FIELDS: &[(&str, &str, Priority)] = &[
    ("proficient", "proficiency", Priority::Medium),
    ("expertise", "expertise", Priority::Medium),
    ("modifier", "modifier", Priority::Low),
];

/// Skill proficiency, expertise and modifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkillDetector;

impl ChangeDetector for SkillDetector {
    fn name(&self) -> &'static str {
        "skills"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Skills]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Skills, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::Medium, "skills")?
        else {
            return Ok(em.finish());
        };

        let skills: BTreeSet<&String> = o
            .as_object()
            .into_iter()
            .chain(n.as_object())
            .flat_map(|m| m.keys())
            .collect();

        for skill in skills {
            let path = format!("{}.{}", ROOT, skill);
            let old_skill = as_object(child(Some(o), skill), &path)?;
            let new_skill = as_object(child(Some(n), skill), &path)?;
            let name = capitalize(&humanize(skill));
            for (key, label, priority) in FIELDS {
                em.scalar(
                    &format!("{}.{}", path, key),
                    old_skill.and_then(|m| m.get(*key)),
                    new_skill.and_then(|m| m.get(*key)),
                    *priority,
                    &format!("{} {}", name, label),
                );
            }
        }

        Ok(em.finish())
    }
}
