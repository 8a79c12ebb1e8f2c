//! Monitor cycle
//!
//! One cycle: load the previous snapshot; with none, store a baseline. An
//! identical digest ends the cycle early. Otherwise detect, filter, route,
//! deliver to every endpoint (awaited) and store the new snapshot. The
//! snapshot is stored whatever the delivery outcome, so a failed delivery
//! is not re-sent next cycle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use sheetwatch_core::errors::Result;
use sheetwatch_core::notify::NotificationContext;
use sheetwatch_core::oplog::{LogLevel, OperationKind, OperationLog};
use sheetwatch_core::snapshot::SnapshotStore;
use sheetwatch_core::{
    log_op_end, log_op_start, ChangeFilter, CycleId, DetectionContext, DetectionEngine,
    GroupCatalog, NotificationRouter,
};
use sheetwatch_delivery::{
    DeliveryFanout, DeliveryService, EndpointReport, ReqwestTransport, SendOptions,
    WebhookTransport,
};
use sheetwatch_store::{snapshot_digest, FsSnapshotStore};
use tokio::time::MissedTickBehavior;

use crate::config::MonitorConfig;
use crate::source::SnapshotSource;

/// Counts from a cycle that found differences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSummary {
    pub changes_detected: usize,
    pub changes_kept: usize,
    pub messages: usize,
    pub detector_failures: Vec<&'static str>,
    pub deliveries: Vec<EndpointReport>,
}

impl ChangeSummary {
    pub fn all_delivered(&self) -> bool {
        self.deliveries.iter().all(EndpointReport::all_delivered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// First snapshot for this character; nothing to compare against.
    Baseline,
    NoChanges,
    Changes(ChangeSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle_id: CycleId,
    pub character_id: String,
    pub digest: String,
    pub outcome: CycleOutcome,
}

/// Totals from [`Monitor::poll`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub cycles: u64,
    pub failures: u64,
}

pub struct Monitor {
    character_id: String,
    engine: DetectionEngine,
    filter: ChangeFilter,
    router: NotificationRouter,
    fanout: DeliveryFanout,
    store: Arc<dyn SnapshotStore>,
    log: Arc<OperationLog>,
    send_options: SendOptions,
}

impl Monitor {
    /// Monitor with every detector, the default filter and router, and no
    /// endpoints.
    pub fn new(
        character_id: impl Into<String>,
        store: Arc<dyn SnapshotStore>,
        log: Arc<OperationLog>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            engine: DetectionEngine::with_default_detectors(log.clone()),
            filter: ChangeFilter::default(),
            router: NotificationRouter::default(),
            fanout: DeliveryFanout::default(),
            store,
            log,
            send_options: SendOptions::default(),
        }
    }

    /// Wire a monitor from configuration: filesystem store, reqwest
    /// transport shared by all endpoints.
    ///
    /// # Errors
    ///
    /// `CONFIG_ERROR` for an invalid filter.
    pub fn from_config(config: &MonitorConfig, log: Arc<OperationLog>) -> Result<Self> {
        let transport: Arc<dyn WebhookTransport> = Arc::new(ReqwestTransport::new());
        Self::from_config_with_transport(config, log, transport)
    }

    /// # Errors
    ///
    /// `CONFIG_ERROR` for an invalid filter.
    pub fn from_config_with_transport(
        config: &MonitorConfig,
        log: Arc<OperationLog>,
        transport: Arc<dyn WebhookTransport>,
    ) -> Result<Self> {
        let filter = config.filter.build(GroupCatalog::builtin())?;
        if !filter.unknown_groups().is_empty() {
            tracing::warn!(
                component = module_path!(),
                unknown = ?filter.unknown_groups(),
                "filter references unknown groups"
            );
        }

        let store = FsSnapshotStore::new(config.snapshot_dir.clone())
            .with_history_limit(config.history_limit);
        let services = config
            .endpoints
            .iter()
            .map(|endpoint| {
                Arc::new(
                    DeliveryService::new(
                        endpoint.webhook_url.clone(),
                        transport.clone(),
                        log.clone(),
                    )
                    .with_name(endpoint.name.clone())
                    .with_policy(config.retry)
                    .with_request_timeout(Duration::from_secs(endpoint.timeout_secs))
                    .with_non_blocking(endpoint.non_blocking),
                )
            })
            .collect();

        Ok(Self::new(config.character_id.clone(), Arc::new(store), log)
            .with_filter(filter)
            .with_router(NotificationRouter::new(config.notification.clone()))
            .with_fanout(DeliveryFanout::new(services)))
    }

    pub fn with_filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_router(mut self, router: NotificationRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_fanout(mut self, fanout: DeliveryFanout) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn with_engine(mut self, engine: DetectionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.send_options = options;
        self
    }

    pub fn character_id(&self) -> &str {
        &self.character_id
    }

    pub fn fanout(&self) -> &DeliveryFanout {
        &self.fanout
    }

    pub fn operation_log(&self) -> &Arc<OperationLog> {
        &self.log
    }

    /// Run one cycle against `snapshot`.
    ///
    /// # Errors
    ///
    /// Store failures (`PERSISTENCE_ERROR`, `IO_ERROR`). Detection and
    /// delivery problems are reported inside the [`CycleReport`].
    pub async fn run_cycle(&self, snapshot: Value) -> Result<CycleReport> {
        let cycle_id = CycleId::new();
        log_op_start!(
            "run_cycle",
            cycle_id = cycle_id.as_str(),
            character_id = self.character_id.as_str()
        );
        let start = std::time::Instant::now();

        let report = self
            .log
            .timed_async(OperationKind::MonitorCycle, self.cycle(cycle_id, snapshot))
            .await?;

        log_op_end!(
            "run_cycle",
            duration_ms = start.elapsed().as_millis() as u64,
            cycle_id = report.cycle_id.as_str(),
            outcome = outcome_label(&report.outcome)
        );
        Ok(report)
    }

    async fn cycle(&self, cycle_id: CycleId, snapshot: Value) -> Result<CycleReport> {
        let id = self.character_id.as_str();
        let digest = snapshot_digest(&snapshot);
        let previous = self
            .log
            .timed(OperationKind::SnapshotLoad, || self.store.load_latest(id))?;

        let report = |outcome| CycleReport {
            cycle_id: cycle_id.clone(),
            character_id: id.to_string(),
            digest: digest.clone(),
            outcome,
        };

        let Some(previous) = previous else {
            self.save(&snapshot)?;
            return Ok(report(CycleOutcome::Baseline));
        };
        if previous.digest == digest {
            return Ok(report(CycleOutcome::NoChanges));
        }

        let now = Utc::now();
        let ctx = DetectionContext::from_snapshot(id, &snapshot)
            .with_cycle_id(cycle_id.clone())
            .with_timestamp(now);
        let detection = self.engine.detect_with_report(&previous.data, &snapshot, &ctx);
        let detected = detection.changes.len();

        let kept = self
            .log
            .timed(OperationKind::Filtering, || self.filter.filter(detection.changes));
        let notify_ctx = NotificationContext {
            character_id: id.to_string(),
            character_name: ctx.character_name.clone(),
            timestamp: now,
        };
        let messages = self
            .log
            .timed(OperationKind::Routing, || self.router.route(&kept, &notify_ctx));

        let deliveries = if messages.is_empty() || self.fanout.is_empty() {
            Vec::new()
        } else {
            self.fanout.deliver(&messages, &self.send_options).await
        };

        self.save(&snapshot)?;

        let summary = ChangeSummary {
            changes_detected: detected,
            changes_kept: kept.len(),
            messages: messages.len(),
            detector_failures: detection.failures.iter().map(|f| f.detector).collect(),
            deliveries,
        };
        self.log.record(
            OperationKind::MonitorCycle,
            if summary.all_delivered() {
                LogLevel::Info
            } else {
                LogLevel::Warn
            },
            "cycle finished",
            Some(&json!({
                "cycle_id": cycle_id.as_str(),
                "character_id": id,
                "changes_len": summary.changes_detected,
                "kept_len": summary.changes_kept,
                "messages_len": summary.messages,
            })),
            None,
        );
        Ok(report(CycleOutcome::Changes(summary)))
    }

    fn save(&self, snapshot: &Value) -> Result<()> {
        self.log
            .timed(OperationKind::SnapshotSave, || {
                self.store.save(&self.character_id, snapshot, Utc::now())
            })
            .map(|_| ())
    }

    /// Fetch and run a cycle every `interval` until `shutdown` resolves. A
    /// cycle in progress always completes. Failures are logged and polling
    /// continues.
    pub async fn poll<S, F>(&self, source: &S, interval: Duration, shutdown: F) -> PollSummary
    where
        S: SnapshotSource + ?Sized,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut summary = PollSummary::default();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    summary.cycles += 1;
                    let result = match source.fetch(&self.character_id).await {
                        Ok(snapshot) => self.run_cycle(snapshot).await.map(|_| ()),
                        Err(e) => Err(e),
                    };
                    if let Err(e) = result {
                        summary.failures += 1;
                        tracing::error!(
                            component = module_path!(),
                            character_id = self.character_id.as_str(),
                            err.code = e.code(),
                            "cycle failed: {}",
                            e
                        );
                    }
                }
            }
        }
        summary
    }
}

fn outcome_label(outcome: &CycleOutcome) -> &'static str {
    match outcome {
        CycleOutcome::Baseline => "baseline",
        CycleOutcome::NoChanges => "no_changes",
        CycleOutcome::Changes(_) => "changes",
    }
}
