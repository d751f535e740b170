//! The writer task: recomputes the attitude every period and publishes it.

use super::RunContext;
use crate::common::TaskRole;
use crate::config::{SweepConfig, WriterConfig};
use crate::record::{Attitude, AttitudeRecord};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// The writer's private counter over the half-open range `[min, max)`.
///
/// Starts at `min`, steps by one and wraps back to `min` on reaching `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepIndex {
    value: i32,
    min: i32,
    max: i32,
}

impl SweepIndex {
    /// Callers validate that `min < max`.
    pub fn new(bounds: SweepConfig) -> Self {
        Self {
            value: bounds.min,
            min: bounds.min,
            max: bounds.max,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn advance(&mut self) {
        self.value += 1;
        if self.value >= self.max {
            self.value = self.min;
        }
    }
}

/// What the writer did over its lifetime.
#[derive(Debug, Clone, Copy)]
pub struct WriterStats {
    /// Records published.
    pub cycles: u64,
    pub sleep_failures: u64,
    /// When the task noticed the termination signal and left its loop.
    pub finished_at: Instant,
}

/// Periodically publishes a freshly computed record.
#[derive(Debug, Clone)]
pub struct WriterTask {
    period: Duration,
    sweep: SweepIndex,
    last_sequence: u64,
}

impl WriterTask {
    pub fn new(period: Duration, sweep: SweepIndex) -> Self {
        Self {
            period,
            sweep,
            last_sequence: 0,
        }
    }

    /// Numbers the first publish `sequence + 1`, so a record shared across
    /// runs keeps a rising sequence.
    pub fn resume_after(mut self, sequence: u64) -> Self {
        self.last_sequence = sequence;
        self
    }

    pub fn from_config(config: &WriterConfig) -> Self {
        Self::new(config.period(), SweepIndex::new(config.sweep))
    }

    /// Runs until the context's termination signal is raised.
    ///
    /// Each cycle computes the attitude outside the lock, publishes it under
    /// a blocking acquire, then sleeps out the rest of the period. A failed
    /// sleep is logged and the next cycle starts straight away.
    pub fn run(mut self, ctx: &RunContext) -> WriterStats {
        let _span = info_span!("task", role = %TaskRole::Writer).entered();
        info!(period = ?self.period, "Writer started.");

        let mut cycles = 0u64;
        let mut sleep_failures = 0u64;
        while !ctx.signal.is_raised() {
            let cycle_start = ctx.clock.now();
            let index = self.sweep.value();
            let attitude = Attitude::from_index(index);
            cycles += 1;
            let sequence = self.last_sequence + cycles;
            self.publish(ctx, attitude, index, sequence);
            debug!(sequence, index, "Published attitude.");
            self.sweep.advance();

            let spent = ctx.clock.now().saturating_duration_since(cycle_start);
            if let Err(e) = ctx.clock.sleep(self.period.saturating_sub(spent)) {
                sleep_failures += 1;
                warn!(error = %e, "Writer sleep failed; continuing.");
            }
        }

        info!(cycles, "Writer stopping.");
        WriterStats {
            cycles,
            sleep_failures,
            finished_at: ctx.clock.now(),
        }
    }

    // Critical section: one struct assignment, nothing else.
    fn publish(&self, ctx: &RunContext, attitude: Attitude, index: i32, sequence: u64) {
        let mut guard = ctx.record.lock();
        guard.overwrite(AttitudeRecord {
            attitude,
            sample_time: ctx.clock.now(),
            sequence,
            index,
        });
    }
}
