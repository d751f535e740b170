//! The shared attitude record and the lock that owns it.
//!
//! The record has no synchronization of its own. All access goes through
//! [`SharedAttitude`], whose single mutex covers every field and the sample
//! timestamp together, so a reader can never see values from two different
//! writes.

use crate::config::AcquirePolicy;
use crate::error::AcquireError;
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::warn;

/// Position and orientation sample.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attitude {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Attitude {
    /// Synthesizes a sample from the writer's sweep index.
    ///
    /// Stands in for a real sensor computation. Any deterministic function of
    /// the index would do.
    pub fn from_index(index: i32) -> Self {
        let i = f64::from(index);
        Self {
            latitude: 0.01 * i,
            longitude: 0.2 * i,
            altitude: 0.25 * i,
            roll: i.sin(),
            pitch: (i * i).cos(),
            yaw: i.cos(),
        }
    }
}

/// One published state of the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeRecord {
    pub attitude: Attitude,
    /// When the writer produced this record.
    pub sample_time: Instant,
    /// Write cycle that produced this record. Zero for the initial record.
    pub sequence: u64,
    /// Sweep index the attitude was computed from.
    pub index: i32,
}

impl AttitudeRecord {
    /// The all-zero record that exists before the first write.
    pub fn initial(created_at: Instant) -> Self {
        Self {
            attitude: Attitude::default(),
            sample_time: created_at,
            sequence: 0,
            index: 0,
        }
    }
}

/// Counters describing how the lock has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Successful acquisitions, by either policy.
    pub acquisitions: u64,
    /// Bounded waits that gave up.
    pub timeouts: u64,
    /// The most guards ever alive at once. Mutual exclusion means this never exceeds one.
    pub max_concurrent_holders: usize,
}

/// The attitude record behind its exclusive lock.
#[derive(Debug)]
pub struct SharedAttitude {
    record: Mutex<AttitudeRecord>,
    poisoned: AtomicBool,
    holders: AtomicUsize,
    max_holders: AtomicUsize,
    acquisitions: AtomicU64,
    timeouts: AtomicU64,
}

impl SharedAttitude {
    pub fn new(created_at: Instant) -> Self {
        Self {
            record: Mutex::new(AttitudeRecord::initial(created_at)),
            poisoned: AtomicBool::new(false),
            holders: AtomicUsize::new(0),
            max_holders: AtomicUsize::new(0),
            acquisitions: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    /// Blocks until the lock is held. Used by the writer, which must never be skipped.
    ///
    /// A poisoned record is handed out as-is; the holder is expected to
    /// [`overwrite`](AttitudeGuard::overwrite) it.
    pub fn lock(&self) -> AttitudeGuard<'_> {
        self.enter(self.record.lock())
    }

    /// Takes the lock according to `policy`.
    ///
    /// Fails with [`AcquireError::TimedOut`] when a bounded wait expires, and
    /// with [`AcquireError::LockFailure`] when the last holder panicked before
    /// finishing its update.
    pub fn acquire(&self, policy: AcquirePolicy) -> Result<AttitudeGuard<'_>, AcquireError> {
        let guard = match policy {
            AcquirePolicy::Blocking => self.record.lock(),
            AcquirePolicy::BoundedWait { deadline } => {
                match self.record.try_lock_for(deadline.as_duration()) {
                    Some(guard) => guard,
                    None => {
                        self.timeouts.fetch_add(1, Ordering::Relaxed);
                        return Err(AcquireError::TimedOut {
                            deadline: deadline.as_duration(),
                        });
                    }
                }
            }
        };
        if self.is_poisoned() {
            return Err(AcquireError::LockFailure {
                reason: "previous holder panicked mid-update; record is incomplete".into(),
            });
        }
        Ok(self.enter(guard))
    }

    /// Takes the lock according to `policy` and copies the record out.
    ///
    /// The lock is released before this returns.
    pub fn read(&self, policy: AcquirePolicy) -> Result<AttitudeRecord, AcquireError> {
        let guard = self.acquire(policy)?;
        Ok(*guard)
    }

    /// Whether the record was left half-written by a panicking holder.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            max_concurrent_holders: self.max_holders.load(Ordering::Acquire),
        }
    }

    /// Zeroes the counters so that [`stats`](Self::stats) covers a fresh span.
    ///
    /// Guards alive at the time still count towards the new maximum.
    pub fn reset_stats(&self) {
        self.acquisitions.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.max_holders
            .store(self.holders.load(Ordering::Acquire), Ordering::Release);
    }

    fn enter<'a>(&'a self, guard: MutexGuard<'a, AttitudeRecord>) -> AttitudeGuard<'a> {
        let holders = self.holders.fetch_add(1, Ordering::AcqRel) + 1;
        self.max_holders.fetch_max(holders, Ordering::AcqRel);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        AttitudeGuard {
            guard,
            owner: self,
        }
    }
}

/// Exclusive access to the record. The lock is released on drop.
pub struct AttitudeGuard<'a> {
    guard: MutexGuard<'a, AttitudeRecord>,
    owner: &'a SharedAttitude,
}

impl AttitudeGuard<'_> {
    /// Replaces the whole record in one step and clears any poisoning.
    pub fn overwrite(&mut self, record: AttitudeRecord) {
        *self.guard = record;
        self.owner.poisoned.store(false, Ordering::Release);
    }
}

impl Deref for AttitudeGuard<'_> {
    type Target = AttitudeRecord;

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

impl DerefMut for AttitudeGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.guard
    }
}

impl Drop for AttitudeGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            warn!("Attitude lock released by a panicking thread; marking record poisoned.");
            self.owner.poisoned.store(true, Ordering::Release);
        }
        // Runs before the inner guard unlocks.
        self.owner.holders.fetch_sub(1, Ordering::AcqRel);
    }
}
