//! Error types for the attitude watch.
//!
//! None of these errors are fatal to a running task. The periodic tasks log
//! them, count them, and carry on with their next cycle.

use std::time::Duration;
use thiserror::Error;

/// Failures to obtain the shared record's lock.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// The bounded wait expired before the lock was released.
    #[error("lock not acquired within {deadline:?}")]
    TimedOut {
        /// The deadline that was exceeded.
        deadline: Duration,
    },

    /// The lock was obtained but the record behind it is unusable.
    #[error("lock failure: {reason}")]
    LockFailure {
        /// What went wrong.
        reason: String,
    },
}

impl AcquireError {
    /// Returns `true` for the expected, non-error timeout outcome.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AcquireError::TimedOut { .. })
    }
}

/// Failures of the clock's timed suspend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// The sleep returned before (or instead of) suspending for the requested time.
    #[error("sleep of {requested:?} interrupted: {reason}")]
    SleepInterrupted {
        /// The duration that was asked for.
        requested: Duration,
        /// Why the sleep failed.
        reason: String,
    },
}

/// Problems with loading or validating the configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The sources could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value was read but makes no sense.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A bounded-wait deadline of zero length would turn the wait into a try-lock.
    #[error("bounded-wait deadline must be non-zero (got {secs}s + {nanos}ns)")]
    ZeroDeadline {
        /// Seconds component as given.
        secs: u64,
        /// Nanoseconds component as given.
        nanos: u32,
    },
}
