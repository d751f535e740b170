//! Defines all configuration structures for the attitude watch.
//!
//! Every timing value and bound the tasks use lives here rather than in the
//! task code. The structs deserialize with `serde` from an optional TOML file
//! plus `ATTITUDE__*` environment overrides, and every field has a default, so
//! an empty source yields the reference run (writer 1 s, reader 10 s, 180 s
//! total, 10 s watchdog).

use crate::error::ConfigError;
use crate::time::Deadline;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

/// Base name of the optional config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "attitude";
/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "ATTITUDE_CONFIG";
/// Prefix for environment overrides, e.g. `ATTITUDE__READER__PERIOD_MS`.
pub const ENV_PREFIX: &str = "ATTITUDE";

/// The top-level configuration for the `AttitudeEngine`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AttitudeConfig {
    pub run: RunConfig,
    pub writer: WriterConfig,
    pub reader: ReaderConfig,
}

/// Settings for the run as a whole.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// How long both tasks run before the termination signal is raised.
    pub total_ms: u64,
}

/// Settings for the writer task.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct WriterConfig {
    /// Time between two publishes.
    pub period_ms: u64,
    pub sweep: SweepConfig,
}

/// The half-open range `[min, max)` the writer's sweep index walks through.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    pub min: i32,
    pub max: i32,
}

/// Settings for the reader task.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Time between two read attempts.
    pub period_ms: u64,
    /// How the reader takes the lock.
    pub acquire: AcquireMode,
    /// The wait limit used when `acquire` is `bounded_wait`.
    pub deadline: DeadlineConfig,
}

/// The lock acquisition modes selectable from configuration.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcquireMode {
    /// Wait for the lock as long as it takes.
    Blocking,
    /// Give up after the configured deadline.
    BoundedWait,
}

/// A deadline as written in a config file: whole seconds plus nanoseconds.
///
/// Either part may be omitted and counts as zero.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct DeadlineConfig {
    #[serde(default)]
    pub secs: u64,
    #[serde(default)]
    pub nanos: u32,
}

/// The resolved policy a reader uses to take the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquirePolicy {
    /// Block until the lock is free.
    Blocking,
    /// Block at most until `deadline` has passed.
    BoundedWait { deadline: Deadline },
}

// --- Defaults ---

impl Default for RunConfig {
    fn default() -> Self {
        Self { total_ms: 180_000 }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            period_ms: 1_000,
            sweep: SweepConfig::default(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { min: -10, max: 10 }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            period_ms: 10_000,
            acquire: AcquireMode::BoundedWait,
            deadline: DeadlineConfig::default(),
        }
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self { secs: 10, nanos: 0 }
    }
}

// --- Loading and validation ---

impl AttitudeConfig {
    /// Loads the configuration from the optional config file and the environment.
    ///
    /// The file is `attitude.toml` in the working directory unless
    /// `ATTITUDE_CONFIG` names another. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let settings = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values for combinations the tasks cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.total_ms == 0 {
            return Err(ConfigError::Invalid("run.total_ms must be positive".into()));
        }
        if self.writer.period_ms == 0 {
            return Err(ConfigError::Invalid("writer.period_ms must be positive".into()));
        }
        if self.reader.period_ms == 0 {
            return Err(ConfigError::Invalid("reader.period_ms must be positive".into()));
        }
        if self.writer.sweep.min >= self.writer.sweep.max {
            return Err(ConfigError::Invalid(format!(
                "writer.sweep range [{}, {}) is empty",
                self.writer.sweep.min, self.writer.sweep.max
            )));
        }
        self.reader.policy()?;
        Ok(())
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.run.total_ms)
    }
}

impl WriterConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl ReaderConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Resolves the configured mode into a policy, validating the deadline.
    ///
    /// A bounded wait may not outlast the reader's period, or a single
    /// attempt could hold the reader past its termination bound.
    pub fn policy(&self) -> Result<AcquirePolicy, ConfigError> {
        match self.acquire {
            AcquireMode::Blocking => Ok(AcquirePolicy::Blocking),
            AcquireMode::BoundedWait => {
                let deadline = Deadline::new(self.deadline.secs, self.deadline.nanos)?;
                if deadline.as_duration() > self.period() {
                    return Err(ConfigError::Invalid(format!(
                        "reader.deadline of {:?} exceeds reader.period_ms of {}",
                        deadline.as_duration(),
                        self.period_ms
                    )));
                }
                Ok(AcquirePolicy::BoundedWait { deadline })
            }
        }
    }
}
