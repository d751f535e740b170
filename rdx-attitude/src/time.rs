//! Monotonic time, elapsed-time math, and lock deadlines.

use crate::error::{ClockError, ConfigError};
use std::time::{Duration, Instant};

const NANOS_PER_SEC: u32 = 1_000_000_000;

/// The single source of time for every task in a run.
///
/// Tasks never call `Instant::now` or `thread::sleep` directly, so a run can be
/// driven by a clock with different sleeping behavior.
pub trait Clock: Send + Sync + 'static {
    /// A monotonically non-decreasing instant.
    fn now(&self) -> Instant;

    /// Suspends the calling thread for at least `duration`.
    fn sleep(&self, duration: Duration) -> Result<(), ClockError>;

    /// Suspends the calling thread for at least `ms` milliseconds.
    fn sleep_millis(&self, ms: u64) -> Result<(), ClockError> {
        self.sleep(Duration::from_millis(ms))
    }
}

/// The production clock, backed by the OS monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> Result<(), ClockError> {
        // `thread::sleep` resumes after spurious wakeups on its own, it never
        // reports a failure.
        std::thread::sleep(duration);
        Ok(())
    }
}

/// Seconds between `start` and `stop`. Zero if `stop` precedes `start`.
pub fn elapsed_seconds(start: Instant, stop: Instant) -> f64 {
    stop.saturating_duration_since(start).as_secs_f64()
}

/// Milliseconds between `start` and `stop`, with sub-millisecond precision.
pub fn elapsed_millis(start: Instant, stop: Instant) -> f64 {
    stop.saturating_duration_since(start).as_secs_f64() * 1_000.0
}

/// The maximum time a bounded-wait acquire may block.
///
/// Built from a seconds part and a nanoseconds part, both of which count.
/// A zero-length deadline is refused: it would make the acquire a try-lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Deadline(Duration);

impl Deadline {
    /// Creates a deadline of `secs` seconds plus `nanos` nanoseconds.
    ///
    /// Nanoseconds of a full second or more carry into the seconds part.
    pub fn new(secs: u64, nanos: u32) -> Result<Self, ConfigError> {
        let carry = u64::from(nanos / NANOS_PER_SEC);
        let whole_secs = secs.checked_add(carry).ok_or_else(|| {
            ConfigError::Invalid(format!("deadline of {secs}s + {nanos}ns overflows"))
        })?;
        let duration = Duration::new(whole_secs, nanos % NANOS_PER_SEC);
        if duration.is_zero() {
            return Err(ConfigError::ZeroDeadline { secs, nanos });
        }
        Ok(Self(duration))
    }

    /// Creates a deadline of `ms` milliseconds.
    pub fn from_millis(ms: u64) -> Result<Self, ConfigError> {
        Self::new(ms / 1_000, ((ms % 1_000) as u32) * 1_000_000)
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}
