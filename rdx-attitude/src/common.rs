//! Contains small shared types used across the engine and its tasks.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identifies which periodic task an event or statistic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRole {
    /// The task that recomputes and publishes the record.
    Writer,
    /// The task that observes and reports the record.
    Reader,
}

impl fmt::Display for TaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskRole::Writer => f.write_str("writer"),
            TaskRole::Reader => f.write_str("reader"),
        }
    }
}

/// Cooperative stop flag shared by the coordinator and both tasks.
///
/// Raised exactly once by the coordinator and polled by each task once per
/// cycle. The release/acquire pairing makes the raise visible to the tasks on
/// their next poll.
#[derive(Debug, Default)]
pub struct TerminationSignal {
    raised: AtomicBool,
}

impl TerminationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tells every task to finish its current cycle and exit.
    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}
