use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{child, CollectionSpec, DetectionError, Emitter, TrackedField};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "character_info";

const FIELDS: &[(&str, &str, Priority)] = &[
    ("name", "name", Priority::High),
    ("level", "level", Priority::Critical),
    ("experience_points", "experience", Priority::Medium),
    ("species", "species", Priority::High),
    ("subspecies", "subspecies", Priority::Medium),
    ("alignment", "alignment", Priority::Low),
    ("inspiration", "inspiration", Priority::Low),
];

const CLASS_FIELDS: &[TrackedField] = &[
    TrackedField {
        key: "level",
        label: "level",
        priority: Priority::Critical,
    },
    TrackedField {
        key: "subclass",
        label: "subclass",
        priority: Priority::High,
    },
];

/// Name, level, experience, species and class list.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicInfoDetector;

impl ChangeDetector for BasicInfoDetector {
    fn name(&self) -> &'static str {
        "basic_info"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::BasicInfo]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::BasicInfo, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::High, "basic info")?
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

        em.collection(
            &format!("{}.classes", ROOT),
            child(Some(o), "classes"),
            child(Some(n), "classes"),
            CollectionSpec {
                noun: "class",
                added: Priority::High,
                removed: Priority::High,
                tracked: CLASS_FIELDS,
            },
        )?;

        Ok(em.finish())
    }
}
