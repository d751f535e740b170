//! # Attitude
//!
//! A periodic writer and a periodic reader sharing one attitude record under a
//! single exclusive lock, with a watchdog (bounded-wait) acquire that reports
//! "no new data" instead of blocking forever.
//!
//! ## Core Concepts
//!
//! - **SharedAttitude**: six position/orientation fields and the instant they
//!   were written, behind one mutex that owns them. A reader never sees fields
//!   from two different writes.
//! - **WriterTask**: every period, computes a new attitude from its sweep index
//!   and publishes it under a blocking acquire.
//! - **ReaderTask**: every period, takes the lock under an `AcquirePolicy`
//!   (`Blocking` or `BoundedWait`), copies the record out, and broadcasts what
//!   it saw, or that it timed out.
//! - **AttitudeEngine**: starts both tasks on their own OS threads, runs them
//!   for a fixed duration, raises a cooperative termination signal and joins
//!   them.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use attitude::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load the configuration (defaults, `attitude.toml`, `ATTITUDE__*`).
//!     let config = AttitudeConfig::load()?;
//!
//!     // 2. Create the engine.
//!     let engine = AttitudeEngine::new(config)?;
//!
//!     // 3. Subscribe to what the reader sees before starting the run.
//!     let mut reads = engine.subscribe_read_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = reads.recv().await {
//!             println!("{:?}", event.outcome);
//!         }
//!     });
//!
//!     // 4. Run for the configured duration.
//!     let summary = engine.run().await?;
//!     println!("Total Time: {:.2}s", summary.total_seconds());
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Attitude Watch";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod record;
pub mod report;
pub mod time;

/// A prelude module for easy importing of the most common attitude types.
pub mod prelude {
    pub use crate::common::{TaskRole, TerminationSignal};
    pub use crate::config::{AcquireMode, AcquirePolicy, AttitudeConfig};
    pub use crate::engine::{AttitudeEngine, RunSummary};
    pub use crate::error::{AcquireError, ClockError, ConfigError};
    pub use crate::events::{AttitudeSnapshot, ReadEvent, ReadOutcome, SystemEvent};
    pub use crate::record::{Attitude, AttitudeRecord, SharedAttitude};
    pub use crate::time::{Clock, Deadline, MonotonicClock};
}
