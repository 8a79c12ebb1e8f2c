use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{child, CollectionSpec, DetectionError, Emitter, TrackedField};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

const ROOT: &str = "inventory";

const ITEM_FIELDS: &[TrackedField] = &[
    TrackedField {
        key: "quantity",
        label: "quantity",
        priority: Priority::Low,
    },
    TrackedField {
        key: "equipped",
        label: "equipped",
        priority: Priority::Medium,
    },
    TrackedField {
        key: "attuned",
        label: "attuned",
        priority: Priority::Medium,
    },
];

/// Items (equipped and attunement state, quantity) and wealth.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventoryDetector;

impl ChangeDetector for InventoryDetector {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Inventory]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        let mut em = Emitter::new(ChangeCategory::Inventory, ctx.timestamp);
        let Some((o, n)) = owned_subtree(old, new, ROOT, &mut em, Priority::Medium, "inventory")?
        else {
            return Ok(em.finish());
        };

        em.collection(
            &format!("{}.items", ROOT),
            child(Some(o), "items"),
            child(Some(n), "items"),
            CollectionSpec {
                noun: "item",
                added: Priority::Medium,
                removed: Priority::Medium,
                tracked: ITEM_FIELDS,
            },
        )?;

        em.tree(
            &format!("{}.wealth", ROOT),
            child(Some(o), "wealth"),
            child(Some(n), "wealth"),
            &|_| Priority::Low,
        );

        Ok(em.finish())
    }
}
