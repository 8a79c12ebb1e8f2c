//! Diff command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use serde_json::Value;
use sheetwatch_core::detection::render_human_summary;
use sheetwatch_core::{DetectionContext, DetectionEngine, GroupCatalog, OperationLog, Priority};
use sheetwatch_engine::source::parse_snapshot;
use sheetwatch_engine::FilterConfig;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Previous snapshot (JSON)
    #[arg(long)]
    pub old: PathBuf,

    /// Current snapshot (JSON)
    #[arg(long)]
    pub new: PathBuf,

    #[arg(long, conflicts_with_all = ["include", "exclude"])]
    pub preset: Option<String>,

    /// Groups to include (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Groups to exclude (repeatable or comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// low, medium, high or critical
    #[arg(long)]
    pub min_priority: Option<String>,

    #[arg(long, default_value = "local")]
    pub character_id: String,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,

    /// Print a Markdown summary
    #[arg(long, conflicts_with = "json")]
    pub markdown: bool,

    #[arg(long)]
    pub no_causation: bool,
}

fn read(path: &Path, character_id: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(parse_snapshot(character_id, &bytes)?)
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let old = read(&args.old, &args.character_id)?;
    let new = read(&args.new, &args.character_id)?;

    let min_priority = args
        .min_priority
        .as_deref()
        .map(|name| {
            Priority::from_name(name).ok_or_else(|| format!("unknown priority `{}`", name))
        })
        .transpose()?;
    let filter = FilterConfig {
        preset: args.preset,
        include: args.include,
        exclude: args.exclude,
        min_priority,
    }
    .build(GroupCatalog::builtin())?;
    for name in filter.unknown_groups() {
        eprintln!("warning: unknown group `{}` ignored", name);
    }

    let mut engine = DetectionEngine::with_default_detectors(Arc::new(OperationLog::new()));
    if args.no_causation {
        engine = engine.without_causation();
    }
    let ctx = DetectionContext::from_snapshot(args.character_id.as_str(), &new);
    let report = engine.detect_with_report(&old, &new, &ctx);
    for failure in &report.failures {
        eprintln!(
            "warning: detector `{}` skipped: {}",
            failure.detector, failure.error
        );
    }

    let kept = filter.filter(report.changes);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&kept)?);
        return Ok(());
    }
    if args.markdown {
        print!("{}", render_human_summary(ctx.display_name(), &kept));
        return Ok(());
    }

    if kept.is_empty() {
        println!("No changes.");
        return Ok(());
    }
    for record in &kept {
        println!(
            "[{:<8}] {:<40} {}",
            record.priority().as_str(),
            record.field_path(),
            record.description()
        );
        if let Some(causation) = record.causation() {
            println!(
                "           caused by {}: {}",
                causation.trigger, causation.trigger_details
            );
        }
    }
    println!("{} change(s)", kept.len());
    Ok(())
}
