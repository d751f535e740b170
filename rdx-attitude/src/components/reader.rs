//! The reader task: periodically observes the record and reports what it saw.

use super::RunContext;
use crate::common::TaskRole;
use crate::config::{AcquirePolicy, ReaderConfig};
use crate::error::{AcquireError, ConfigError};
use crate::events::{AttitudeSnapshot, ReadEvent, ReadOutcome};
use crate::time::elapsed_seconds;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info, info_span, warn};

/// What the reader did over its lifetime.
#[derive(Debug, Clone, Copy)]
pub struct ReaderStats {
    /// Read attempts, whatever their outcome.
    pub attempts: u64,
    /// Attempts that copied the record.
    pub reads: u64,
    /// Bounded waits that expired.
    pub timeouts: u64,
    /// Attempts that failed for any other reason.
    pub failures: u64,
    pub sleep_failures: u64,
    /// When the task noticed the termination signal and left its loop.
    pub finished_at: Instant,
}

/// Periodically takes the lock under an [`AcquirePolicy`] and broadcasts a
/// [`ReadEvent`] describing the outcome.
#[derive(Debug, Clone)]
pub struct ReaderTask {
    period: Duration,
    policy: AcquirePolicy,
    events: broadcast::Sender<ReadEvent>,
}

impl ReaderTask {
    pub fn new(
        period: Duration,
        policy: AcquirePolicy,
        events: broadcast::Sender<ReadEvent>,
    ) -> Self {
        Self {
            period,
            policy,
            events,
        }
    }

    pub fn from_config(
        config: &ReaderConfig,
        events: broadcast::Sender<ReadEvent>,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(config.period(), config.policy()?, events))
    }

    /// Runs until the context's termination signal is raised.
    ///
    /// The period is measured from the start of each attempt, so time spent
    /// in a bounded wait comes out of the following sleep rather than adding
    /// to it. No outcome ends the loop.
    pub fn run(self, ctx: &RunContext) -> ReaderStats {
        let _span = info_span!("task", role = %TaskRole::Reader).entered();
        info!(period = ?self.period, policy = ?self.policy, "Reader started.");

        let mut stats = ReaderStats {
            attempts: 0,
            reads: 0,
            timeouts: 0,
            failures: 0,
            sleep_failures: 0,
            finished_at: ctx.started_at,
        };
        while !ctx.signal.is_raised() {
            let cycle_start = ctx.clock.now();
            let count = stats.attempts;
            stats.attempts += 1;

            let outcome = self.observe(ctx);
            let elapsed_s = elapsed_seconds(ctx.started_at, ctx.clock.now());
            match &outcome {
                ReadOutcome::Snapshot(snapshot) => {
                    stats.reads += 1;
                    debug!(
                        count,
                        sequence = snapshot.record.sequence,
                        staleness_ms = snapshot.staleness_ms,
                        "Read attitude."
                    );
                }
                ReadOutcome::NoData => {
                    stats.timeouts += 1;
                    info!(count, "No new data available at {:.2}s.", elapsed_s);
                }
                ReadOutcome::Failed(e) => {
                    stats.failures += 1;
                    warn!(count, error = %e, "Read skipped.");
                }
            }
            // No subscribers is fine.
            self.events
                .send(ReadEvent {
                    count,
                    outcome,
                    elapsed_s,
                })
                .ok();

            let spent = ctx.clock.now().saturating_duration_since(cycle_start);
            if let Err(e) = ctx.clock.sleep(self.period.saturating_sub(spent)) {
                stats.sleep_failures += 1;
                warn!(error = %e, "Reader sleep failed; continuing.");
            }
        }

        info!(attempts = stats.attempts, "Reader stopping.");
        stats.finished_at = ctx.clock.now();
        stats
    }

    /// One attempt. The record is copied out and the lock released before
    /// anything is formatted or sent.
    fn observe(&self, ctx: &RunContext) -> ReadOutcome {
        match ctx.record.read(self.policy) {
            Ok(record) => ReadOutcome::Snapshot(AttitudeSnapshot::new(
                record,
                ctx.started_at,
                ctx.clock.now(),
            )),
            Err(AcquireError::TimedOut { .. }) => ReadOutcome::NoData,
            Err(e) => ReadOutcome::Failed(e),
        }
    }
}
