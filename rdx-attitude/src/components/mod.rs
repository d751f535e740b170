//! Contains the two periodic tasks and the context they share.
//!
//! Each task is a plain blocking loop meant to own an OS thread for the whole
//! run. The `AttitudeEngine` builds one [`RunContext`], hands it to both
//! tasks by reference, and raises its termination signal to stop them.

pub mod reader;
pub mod writer;

use crate::common::TerminationSignal;
use crate::record::SharedAttitude;
use crate::time::Clock;
use std::sync::Arc;
use std::time::Instant;

/// Everything the writer and reader share during one run.
pub struct RunContext {
    pub record: Arc<SharedAttitude>,
    pub signal: TerminationSignal,
    pub clock: Arc<dyn Clock>,
    /// Reference point for every "elapsed run time" the tasks report.
    pub started_at: Instant,
}

impl RunContext {
    pub fn new(record: Arc<SharedAttitude>, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            record,
            signal: TerminationSignal::new(),
            clock,
            started_at,
        }
    }
}
