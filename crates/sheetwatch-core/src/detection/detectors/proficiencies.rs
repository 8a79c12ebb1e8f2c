use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{child, DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "proficiencies";

const LISTS: &[(&str, &str, Priority)] = &[
    ("languages", "language", Priority::Low),
    ("tools", "tool proficiency", Priority::Low),
    ("armor", "armor proficiency", Priority::Medium),
    ("weapons", "weapon proficiency", Priority::Medium),
];

/// Languages plus tool, armor and weapon proficiencies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProficiencyDetector;

impl ChangeDetector for ProficiencyDetector {
    fn name(&self) -> &'static str {
        "proficiencies"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Proficiencies]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Proficiencies, ctx.timestamp);
        let Some((o, n)) =
            owned_subtree(old, new, ROOT, &mut em, Priority::Low, "proficiencies")?
        else {
            return Ok(em.finish());
        };

        for (key, noun, priority) in LISTS {
            em.string_set(
                &format!("{}.{}", ROOT, key),
                child(Some(o), key),
                child(Some(n), key),
                noun,
                *priority,
            )?;
        }

        Ok(em.finish())
    }
}
