//! Run command: one monitor cycle, or a polling loop until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use sheetwatch_core::OperationLog;
use sheetwatch_engine::{
    CycleOutcome, CycleReport, FileSnapshotSource, Monitor, MonitorConfig, SnapshotSource,
};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Configuration file (TOML); `SHEETWATCH__*` variables override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Snapshot file to read each cycle
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Keep polling at the configured interval until interrupted
    #[arg(long)]
    pub poll: bool,

    /// Probe every endpoint before the first cycle
    #[arg(long)]
    pub validate: bool,
}

pub fn execute(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = MonitorConfig::load(args.config.as_deref())?;
    let log = Arc::new(OperationLog::new());
    let monitor = Monitor::from_config(&config, log.clone())?;
    let source = FileSnapshotSource::new(&args.snapshot);
    let runtime = super::runtime()?;

    let all_delivered = runtime.block_on(drive(&args, &config, &monitor, &source))?;

    println!("{}", serde_json::to_string_pretty(&log.get_operation_stats())?);

    if all_delivered {
        Ok(())
    } else {
        Err("some notifications were not delivered".into())
    }
}

async fn drive(
    args: &RunArgs,
    config: &MonitorConfig,
    monitor: &Monitor,
    source: &FileSnapshotSource,
) -> Result<bool, Box<dyn std::error::Error>> {
    if args.validate {
        let mut invalid = 0;
        for (name, result) in monitor.fanout().validate_all().await {
            if result.is_valid {
                println!("endpoint {}: ok", name);
            } else {
                invalid += 1;
                println!(
                    "endpoint {}: {} {}",
                    name,
                    result.error_kind.unwrap_or("UNKNOWN_ERROR"),
                    result.error_message.as_deref().unwrap_or("")
                );
            }
        }
        if invalid > 0 {
            return Err(format!("{} endpoint(s) failed validation", invalid).into());
        }
    }

    if args.poll {
        let interval = Duration::from_secs(config.poll_interval_secs);
        let shutdown = async {
            // A failed signal handler means no graceful shutdown; stop at once.
            let _ = tokio::signal::ctrl_c().await;
        };
        let summary = monitor.poll(source, interval, shutdown).await;
        println!("{} cycle(s), {} failure(s)", summary.cycles, summary.failures);
        return Ok(summary.failures == 0);
    }

    let snapshot = source.fetch(monitor.character_id()).await?;
    let report = monitor.run_cycle(snapshot).await?;
    print_report(&report);
    Ok(match &report.outcome {
        CycleOutcome::Changes(summary) => summary.all_delivered(),
        _ => true,
    })
}

fn print_report(report: &CycleReport) {
    println!(
        "cycle {} for {} ({})",
        report.cycle_id.as_str(),
        report.character_id,
        report.digest
    );
    match &report.outcome {
        CycleOutcome::Baseline => println!("baseline snapshot stored"),
        CycleOutcome::NoChanges => println!("no changes"),
        CycleOutcome::Changes(summary) => {
            println!(
                "{} change(s) detected, {} kept, {} message(s)",
                summary.changes_detected, summary.changes_kept, summary.messages
            );
            for detector in &summary.detector_failures {
                println!("  detector {} failed", detector);
            }
            for endpoint in &summary.deliveries {
                println!(
                    "  {}: {}/{} delivered",
                    endpoint.endpoint,
                    endpoint.delivered(),
                    endpoint.outcomes.len()
                );
                for outcome in endpoint.outcomes.iter().filter(|o| !o.is_delivered()) {
                    println!("    {}", outcome);
                }
            }
        }
    }
}
