//! Defines all public event types broadcast by the attitude engine.
//!
//! Presentation never happens inside the tasks. The reader copies the record
//! out of the lock, releases it, and broadcasts a [`ReadEvent`]; whoever
//! subscribed decides how to show it.

use crate::common::TaskRole;
use crate::error::AcquireError;
use crate::record::AttitudeRecord;
use crate::time::elapsed_millis;
use std::time::{Duration, Instant};

/// The reader's view of the record after a successful acquire.
#[derive(Debug, Clone, PartialEq)]
pub struct AttitudeSnapshot {
    pub record: AttitudeRecord,
    /// When the record was written, in ms since the run started.
    pub sample_ms: f64,
    /// How old the record was when it was read, in ms.
    pub staleness_ms: f64,
}

impl AttitudeSnapshot {
    pub fn new(record: AttitudeRecord, run_started: Instant, read_at: Instant) -> Self {
        Self {
            sample_ms: elapsed_millis(run_started, record.sample_time),
            staleness_ms: elapsed_millis(record.sample_time, read_at),
            record,
        }
    }
}

/// What one reader cycle produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    /// The lock was taken and the record copied.
    Snapshot(AttitudeSnapshot),
    /// The bounded wait expired; nothing was read.
    NoData,
    /// The lock could not be used for another reason; nothing was read.
    Failed(AcquireError),
}

/// Fired once per reader cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadEvent {
    /// Zero-based attempt counter.
    pub count: u64,
    pub outcome: ReadOutcome,
    /// Seconds since the run started, taken after the attempt.
    pub elapsed_s: f64,
}

/// Events related to the lifecycle of the engine and its tasks.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once both tasks have been started.
    EngineStarted { timestamp: Instant },
    /// Fired when the run duration has passed (or the run was interrupted).
    TerminationSignalled { elapsed_s: f64, interrupted: bool },
    /// Fired when a task has left its loop and been joined.
    TaskExited {
        role: TaskRole,
        cycles: u64,
        /// Time between the termination signal and the task leaving its loop.
        exit_latency: Duration,
    },
    /// Fired once after both tasks are joined.
    EngineShutdown { total_s: f64 },
}
