//! Built-in detectors, one per snapshot subtree.

mod abilities;
mod basic_info;
mod combat;
mod features;
mod inventory;
mod narrative;
mod proficiencies;
mod skills;
mod spells;

pub use abilities::AbilityDetector;
pub use basic_info::BasicInfoDetector;
pub use combat::CombatDetector;
pub use features::FeatureDetector;
pub use inventory::InventoryDetector;
pub use narrative::{AppearanceDetector, BackgroundDetector, MetaDetector};
pub use proficiencies::ProficiencyDetector;
pub use skills::SkillDetector;
pub use spells::{normalize_tiers, SlotTier, SpellDetector};

use serde_json::Value;

use crate::detection::common::{as_object, child, DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

/// Compares one domain subtree of two snapshots.
///
/// Implementations must be pure: the same inputs always produce the same
/// records in the same order, and identical inputs produce none.
pub trait ChangeDetector: Send + Sync {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &'static str;

    /// Categories this detector emits.
    fn categories(&self) -> &'static [ChangeCategory];

    /// Compare `old` and `new` (whole snapshots).
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError`] when the owned subtree has an unexpected
    /// shape. The engine drops this detector's output and keeps going.
    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError>;
}

/// Every built-in detector, in emission order.
pub fn default_detectors() -> Vec<Box<dyn ChangeDetector>> {
    vec![
        Box::new(BasicInfoDetector),
        Box::new(AbilityDetector),
        Box::new(SkillDetector),
        Box::new(ProficiencyDetector),
        Box::new(CombatDetector),
        Box::new(SpellDetector),
        Box::new(InventoryDetector),
        Box::new(FeatureDetector),
        Box::new(AppearanceDetector),
        Box::new(BackgroundDetector),
        Box::new(MetaDetector),
    ]
}

/// Resolve the detector's top-level subtree on both sides.
///
/// Returns both values when present on both sides. When only one side has
/// the subtree a single whole-subtree record is emitted and `None` returned.
pub(crate) fn owned_subtree<'a>(
    old: &'a Value,
    new: &'a Value,
    key: &str,
    em: &mut Emitter,
    priority: Priority,
    label: &str,
) -> Result<Option<(&'a Value, &'a Value)>, DetectionError> {
    let old_root = child(Some(old), key);
    let new_root = child(Some(new), key);
    as_object(old_root, key)?;
    as_object(new_root, key)?;
    match (old_root, new_root) {
        (Some(o), Some(n)) => Ok(Some((o, n))),
        _ => {
            em.subtree_presence(key, old_root, new_root, priority, label);
            Ok(None)
        }
    }
}
