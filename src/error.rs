//! Filepath: src/error.rs
//!
//! Error type for the benchmark harness and binary.
//!
//! The map itself is infallible; everything here comes from console I/O,
//! thread management, or configuration.

use std::io;

/// Errors raised while configuring or running a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Writing a report or waiting on the console failed.
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The OS refused to start a reader thread.
    #[error("failed to spawn reader thread {id}: {source}")]
    Spawn {
        /// Worker id of the thread that could not start.
        id: usize,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A reader thread panicked before recording its result.
    #[error("reader thread {id} panicked")]
    WorkerPanicked {
        /// Worker id of the thread that panicked.
        id: usize,
    },

    /// Configuration values out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
