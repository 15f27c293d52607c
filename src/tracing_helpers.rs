//! Zero-cost tracing helpers for the map internals.
//!
//! When the `trace-internals` feature is enabled, these macros forward to the
//! `tracing` crate. When disabled (default), they compile to no-ops so the
//! insert and growth paths carry no logging overhead while being measured.
//!
//! The harness itself always logs through `tracing` directly; only code on the
//! map's hot paths goes through these macros.
//!
//! # Usage
//!
//! ```bash
//! # Normal build - no map-internal logging
//! cargo run --release
//!
//! # See every table growth and clear
//! RUST_LOG=valuescan::map=trace cargo run --release --features trace-internals
//! ```

#![allow(unused_macros, unused_imports)]

/// Trace-level logging (most verbose). Compiles to no-op without `trace-internals`.
#[cfg(feature = "trace-internals")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "trace-internals"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        // Completely empty - zero cost
    };
}

/// Debug-level logging. Compiles to no-op without `trace-internals`.
#[cfg(feature = "trace-internals")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "trace-internals"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

// Export macros for use within crate
pub(crate) use debug_log;
pub(crate) use trace_log;
