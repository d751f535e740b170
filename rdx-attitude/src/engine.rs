//! The coordinator that owns a run from start to finish.

use crate::common::TaskRole;
use crate::components::reader::{ReaderStats, ReaderTask};
use crate::components::writer::{WriterStats, WriterTask};
use crate::components::RunContext;
use crate::config::AttitudeConfig;
use crate::error::ConfigError;
use crate::events::{ReadEvent, SystemEvent};
use crate::record::{LockStats, SharedAttitude};
use crate::time::{elapsed_seconds, Clock, MonotonicClock};
use anyhow::Context;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Everything measured over one run.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub writer: WriterStats,
    pub reader: ReaderStats,
    /// Time from the termination signal until the writer left its loop.
    pub writer_exit_latency: Duration,
    /// Time from the termination signal until the reader left its loop.
    pub reader_exit_latency: Duration,
    /// Lock usage during this run.
    pub lock: LockStats,
    /// Start of the run until both tasks were joined.
    pub total: Duration,
    /// Whether the run was cut short before its configured duration.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn total_seconds(&self) -> f64 {
        self.total.as_secs_f64()
    }
}

/// The attitude engine.
///
/// Holds the configuration, the shared record and the event channels. The
/// record is created here, once, and outlives every run. Cloning the engine
/// yields another handle to the same record and channels.
#[derive(Clone)]
pub struct AttitudeEngine {
    config: Arc<AttitudeConfig>,
    clock: Arc<dyn Clock>,
    record: Arc<SharedAttitude>,
    /// Records published over every run so far.
    published: Arc<AtomicU64>,
    read_event_sender: broadcast::Sender<ReadEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
}

impl AttitudeEngine {
    /// Creates a new `AttitudeEngine` on the monotonic clock.
    pub fn new(config: AttitudeConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(MonotonicClock))
    }

    /// Creates a new `AttitudeEngine` whose tasks use `clock`.
    pub fn with_clock(
        config: AttitudeConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let (read_event_sender, _) = broadcast::channel(256);
        let (system_event_sender, _) = broadcast::channel(64);
        let record = Arc::new(SharedAttitude::new(clock.now()));
        Ok(Self {
            config: Arc::new(config),
            clock,
            record,
            published: Arc::new(AtomicU64::new(0)),
            read_event_sender,
            system_event_sender,
        })
    }

    /// Runs for the configured duration, or until Ctrl+C.
    pub async fn run(&self) -> anyhow::Result<RunSummary> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(
                    "Failed to listen for Ctrl+C: {}. Running for the full duration.",
                    e
                );
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs for the configured duration, or until `interrupt` completes.
    ///
    /// This method will:
    /// 1. Start the writer and reader, each on its own blocking thread.
    /// 2. Wait out the run duration (or the interrupt).
    /// 3. Raise the termination signal and join both tasks.
    ///
    /// Errors only if a task panicked. Task-level failures (timeouts, lock
    /// failures, failed sleeps) are absorbed by the tasks themselves.
    pub async fn run_until<F>(&self, interrupt: F) -> anyhow::Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        info!("AttitudeEngine starting up...");
        // Lock counters cover this run only; sequence numbers carry on.
        self.record.reset_stats();
        let last_sequence = self.published.load(Ordering::Acquire);
        let ctx = Arc::new(RunContext::new(
            Arc::clone(&self.record),
            Arc::clone(&self.clock),
        ));
        let writer = WriterTask::from_config(&self.config.writer).resume_after(last_sequence);
        let reader =
            ReaderTask::from_config(&self.config.reader, self.read_event_sender.clone())?;

        let writer_ctx = Arc::clone(&ctx);
        let writer_handle = tokio::task::spawn_blocking(move || writer.run(&writer_ctx));
        let reader_ctx = Arc::clone(&ctx);
        let reader_handle = tokio::task::spawn_blocking(move || reader.run(&reader_ctx));
        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: ctx.started_at,
            })
            .ok();

        let total = self.config.total_duration();
        info!("Engine running for {:?}.", total);
        let interrupted = tokio::select! {
            _ = tokio::time::sleep(total) => false,
            _ = interrupt => true,
        };

        ctx.signal.raise();
        let raised_at = ctx.clock.now();
        let elapsed_s = elapsed_seconds(ctx.started_at, raised_at);
        info!(interrupted, "Termination signal raised at {:.2}s.", elapsed_s);
        self.system_event_sender
            .send(SystemEvent::TerminationSignalled {
                elapsed_s,
                interrupted,
            })
            .ok();

        let writer = writer_handle.await.context("writer task panicked")?;
        self.published.fetch_add(writer.cycles, Ordering::AcqRel);
        let writer_exit_latency = writer.finished_at.saturating_duration_since(raised_at);
        self.announce_exit(TaskRole::Writer, writer.cycles, writer_exit_latency);

        let reader = reader_handle.await.context("reader task panicked")?;
        let reader_exit_latency = reader.finished_at.saturating_duration_since(raised_at);
        self.announce_exit(TaskRole::Reader, reader.attempts, reader_exit_latency);

        let summary = RunSummary {
            writer,
            reader,
            writer_exit_latency,
            reader_exit_latency,
            lock: self.record.stats(),
            total: ctx.clock.now().saturating_duration_since(ctx.started_at),
            interrupted,
        };
        self.system_event_sender
            .send(SystemEvent::EngineShutdown {
                total_s: summary.total_seconds(),
            })
            .ok();
        info!("AttitudeEngine has shut down after {:.2}s.", summary.total_seconds());
        Ok(summary)
    }

    fn announce_exit(&self, role: TaskRole, cycles: u64, exit_latency: Duration) {
        info!(%role, cycles, ?exit_latency, "Task joined.");
        self.system_event_sender
            .send(SystemEvent::TaskExited {
                role,
                cycles,
                exit_latency,
            })
            .ok();
    }

    /// The shared record, for instrumentation. Holding its lock stalls both tasks.
    pub fn record(&self) -> Arc<SharedAttitude> {
        Arc::clone(&self.record)
    }

    /// Subscribes to the `ReadEvent` stream.
    pub fn subscribe_read_events(&self) -> broadcast::Receiver<ReadEvent> {
        self.read_event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }
}
