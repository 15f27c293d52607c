//! # `valuescan`
//!
//! Measures two ways of reading every value out of a concurrent hash map
//! while many threads do the same thing at once.
//!
//! | Strategy | Operation | Blocks writers | Result |
//! |----------|-----------|----------------|--------|
//! | Snapshot | [`ConcurrentMap::snapshot_values`] | yes, every segment while copying | materialized `Vec` |
//! | Projection | [`ConcurrentMap::values`] | no | lazy iterator |
//!
//! The map is lock-striped: writers lock one segment, a snapshot locks all of
//! them, and the projection walks the buckets under a [`seize`] guard without
//! taking any lock.
//!
//! ```rust
//! use valuescan::{CompositeKey, ConcurrentMap, ReadStrategy};
//!
//! let map: ConcurrentMap<CompositeKey, bool> = ConcurrentMap::with_segments(4);
//! map.try_insert(CompositeKey::new("a", "b", "en-us", "web"), false);
//!
//! let guard = map.guard();
//! for strategy in ReadStrategy::ALL {
//!     assert_eq!(strategy.read(&map, &guard).count(), 1);
//! }
//! ```
//!
//! ## Running a Benchmark
//!
//! [`Harness`] drives a full run: fill the map with random keys, then run one
//! phase of concurrent readers per strategy, pausing between phases through a
//! [`Pause`] implementation.
//!
//! ```rust
//! use valuescan::{BenchConfig, CacheMap, ConcurrentMap, Harness, NoPause};
//!
//! let map: CacheMap = ConcurrentMap::with_segments(4);
//! let config = BenchConfig { items: 100, threads: 4, progress_interval: 50, segments: None };
//! let mut harness = Harness::new(&map, config, NoPause, std::io::sink());
//!
//! let run = harness.run().unwrap();
//! assert!(run.phases.iter().all(|p| p.workers.iter().all(|w| w.retrieved == 100)));
//! ```
//!
//! ## Features
//!
//! - `trace-internals`: emit `tracing` events from map growth and clear.
//! - `mimalloc`: use mimalloc as the binary's global allocator.

#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod harness;
pub mod key;
pub mod map;
pub mod ordering;
pub mod pause;
pub mod report;
pub mod strategy;

mod tracing_helpers;

// Re-export main types for convenience
pub use config::{Args, BenchConfig, LogFormat};
pub use error::{Error, Result};
pub use harness::{CacheMap, Harness};
pub use key::CompositeKey;
pub use map::{ConcurrentMap, MapGuard};
pub use pause::{NoPause, Pause, StdinPause};
pub use report::{FillReport, PhaseReport, RunReport, WorkerRecord};
pub use strategy::{ReadStrategy, ReadValues};
