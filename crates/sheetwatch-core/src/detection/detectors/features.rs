use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{child, CollectionSpec, DetectionError, Emitter, TrackedField};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "features";

const USES: &[TrackedField] = &[TrackedField {
    key: "uses",
    label: "uses",
    priority: Priority::Low,
}];

const LISTS: &[(&str, &str, Priority)] = &[
    ("class_features", "class feature", Priority::Medium),
    ("feats", "feat", Priority::High),
    ("racial_traits", "trait", Priority::Medium),
];

/// Class features, feats and species traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureDetector;

impl ChangeDetector for FeatureDetector {
    fn name(&self) -> &'static str {
        "features"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Features]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Features, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::Medium, "features")?
        else {
            return Ok(em.finish());
        };

        for (key, noun, priority) in LISTS {
            em.collection(
                &format!("{}.{}", ROOT, key),
                child(Some(o), key),
                child(Some(n), key),
                CollectionSpec {
                    noun: *noun,
                    added: *priority,
                    removed: *priority,
                    tracked: USES,
                },
            )?;
        }

        Ok(em.finish())
    }
}
