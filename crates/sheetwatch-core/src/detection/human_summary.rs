//! Human-readable summary of detected changes.

use crate::detection::model::{ChangeCategory, ChangeRecord};

/// Render a Markdown summary of `records`, grouped by category in order of
/// first appearance.
///
/// Informational only; used by the CLI `diff` command.
pub fn render_human_summary(character: &str, records: &[ChangeRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!("## Changes for {}\n\n", character));

    if records.is_empty() {
        out.push_str("_No changes detected._\n");
        return out;
    }

    out.push_str(&format!("**Total**: {}\n\n", records.len()));

    let mut order: Vec<ChangeCategory> = Vec::new();
    for r in records {
        if !order.contains(&r.category()) {
            order.push(r.category());
        }
    }

    for category in order {
        out.push_str(&format!("### {}\n\n", category.display_name()));
        for r in records.iter().filter(|r| r.category() == category) {
            out.push_str(&format!(
                "- [{}] {} (`{}`)\n",
                r.priority().as_str(),
                r.description(),
                r.field_path()
            ));
            if let Some(c) = r.causation() {
                out.push_str(&format!("  - caused by {}: {}\n", c.trigger, c.trigger_details));
            }
            if let Some(a) = r.attribution() {
                out.push_str(&format!("  - from {} {}\n", a.source_type, a.source_name));
            }
        }
        out.push('\n');
    }

    out
}
