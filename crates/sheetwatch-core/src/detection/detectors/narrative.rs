//! Free-form subtrees: appearance, background and sheet metadata.

use serde_json::Value;

use super::{owned_subtree, ChangeDetector};
use crate::detection::common::{DetectionError, Emitter};
use crate::detection::engine::DetectionContext;
use crate::detection::model::{ChangeCategory, ChangeRecord, Priority};

fn detect_tree(
    old: &Value,
    new: &Value,
    ctx: &DetectionContext,
    root: &str,
    category: ChangeCategory,
    label: &str,
    priority_for: &dyn Fn(&str) -> Priority,
) -> Result<Vec<ChangeRecord>, DetectionError> {
    let mut em = Emitter::new(category, ctx.timestamp);
    if let Some((o, n)) = owned_subtree(old, new, root, &mut em, Priority::Low, label)? {
        em.tree(root, Some(o), Some(n), priority_for);
    }
    Ok(em.finish())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AppearanceDetector;

impl ChangeDetector for AppearanceDetector {
    fn name(&self) -> &'static str {
        "appearance"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Appearance]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        detect_tree(
            old,
            new,
            ctx,
            "appearance",
            ChangeCategory::Appearance,
            "appearance",
            &|_| Priority::Low,
        )
    }
}

/// Background name is medium priority; the prose fields are low.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundDetector;

impl ChangeDetector for BackgroundDetector {
    fn name(&self) -> &'static str {
        "background"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Background]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        detect_tree(
            old,
            new,
            ctx,
            "background",
            ChangeCategory::Background,
            "background",
            &|key| {
                if key == "name" {
                    Priority::Medium
                } else {
                    Priority::Low
                }
            },
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MetaDetector;

impl ChangeDetector for MetaDetector {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn categories(&self) -> &'static [ChangeCategory] {
        &[ChangeCategory::Meta]
    }

    fn detect_changes(
        &self,
        old: &Value,
        new: &Value,
        ctx: &DetectionContext,
    ) -> Result<Vec<ChangeRecord>, DetectionError> {
        detect_tree(
            old,
            new,
            ctx,
            "meta",
            ChangeCategory::Meta,
            "sheet metadata",
            &|_| Priority::Low,
        )
    }
}
