//! Filepath: src/config.rs
//!
//! Benchmark configuration and its command-line / environment surface.
//!
//! [`Args`] is what `clap` parses; [`BenchConfig`] is the validated subset
//! the harness consumes.

use crate::error::{Error, Result};

/// Default number of map entries created by the fill phase.
pub const DEFAULT_ITEMS: usize = 3_000_000;

/// Default number of concurrent reader threads per measurement phase.
pub const DEFAULT_THREADS: usize = 100;

/// Default fill-phase progress interval.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100_000;

/// Output format of the log layer installed by the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Single-line human-readable events.
    #[default]
    Compact,

    /// Newline-delimited JSON events.
    Json,
}

/// Command-line arguments for the `valuescan` binary.
#[derive(Debug, Clone, clap::Parser)]
#[command(
    name = "valuescan",
    version,
    about = "Compare a locking snapshot read with a lock-free projected read of a concurrent map"
)]
pub struct Args {
    /// Number of entries to insert before measuring.
    #[arg(long, env = "VALUESCAN_ITEMS", default_value_t = DEFAULT_ITEMS)]
    pub items: usize,

    /// Number of concurrent reader threads per strategy.
    #[arg(long, env = "VALUESCAN_THREADS", default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Log fill progress every N insertions.
    #[arg(
        long = "progress-every",
        env = "VALUESCAN_PROGRESS_EVERY",
        default_value_t = DEFAULT_PROGRESS_INTERVAL
    )]
    pub progress_every: usize,

    /// Lock-stripe count of the map.
    ///
    /// Defaults to a multiple of the available parallelism.
    #[arg(long, env = "VALUESCAN_SEGMENTS")]
    pub segments: Option<usize>,

    /// Run without waiting for Enter between phases.
    #[arg(long, env = "VALUESCAN_NO_PAUSE")]
    pub no_pause: bool,

    /// Log output format.
    #[arg(
        long = "log-format",
        env = "VALUESCAN_LOG_FORMAT",
        default_value_t = LogFormat::default(),
        value_enum
    )]
    pub log_format: LogFormat,
}

impl Args {
    /// Extract and validate the harness configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any value is out of range.
    pub fn bench_config(&self) -> Result<BenchConfig> {
        let config: BenchConfig = BenchConfig {
            items: self.items,
            threads: self.threads,
            progress_interval: self.progress_every,
            segments: self.segments,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Validated benchmark parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Entries created by the fill phase.
    pub items: usize,
    /// Reader threads per measurement phase.
    pub threads: usize,
    /// Fill progress is logged when `index % progress_interval == 0`.
    pub progress_interval: usize,
    /// Map segment count; `None` picks the map's default.
    pub segments: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            items: DEFAULT_ITEMS,
            threads: DEFAULT_THREADS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            segments: None,
        }
    }
}

impl BenchConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero threads, a zero progress
    /// interval, or zero segments.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(Error::InvalidConfig("threads must be at least 1".into()));
        }
        if self.progress_interval == 0 {
            return Err(Error::InvalidConfig(
                "progress interval must be at least 1".into(),
            ));
        }
        if self.segments == Some(0) {
            return Err(Error::InvalidConfig("segments must be at least 1".into()));
        }
        Ok(())
    }
}
