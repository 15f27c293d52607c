//! Filepath: src/harness.rs
//!
//! The benchmark driver.
//!
//! A run has one fill phase and one measurement phase per [`ReadStrategy`]:
//!
//! 1. **Fill** (single writer): `items` fresh [`CompositeKey`]s are
//!    `try_insert`ed with the placeholder value `false`.
//! 2. **Measure** (many readers): `threads` named OS threads start together
//!    in a scope. Each one reads every value with the phase's strategy,
//!    iterates to the end, and records its timing and its position in the
//!    start and completion orders.
//!
//! Shared per-phase state is limited to an [`ElapsedTotal`] (atomic) and two
//! [`OrderLog`]s (mutex-protected appends). Per-worker records come back
//! through the join handles.

use std::hash::{BuildHasher, Hash, RandomState};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::BenchConfig;
use crate::error::{Error, Result};
use crate::key::CompositeKey;
use crate::map::ConcurrentMap;
use crate::ordering::RELAXED;
use crate::pause::Pause;
use crate::report::{self, FillReport, PhaseReport, RunReport, WorkerRecord};
use crate::strategy::ReadStrategy;

/// Map type the benchmark fills and reads.
pub type CacheMap<S = RandomState> = ConcurrentMap<CompositeKey, bool, S>;

/// Language tag shared by every generated key.
pub const LANGUAGE_TAG: &str = "en-us";

/// Database tag shared by every generated key.
pub const DATABASE_TAG: &str = "web";

/// Prompt shown at every pause point.
pub const CONTINUE_PROMPT: &str = "Press Enter to continue...";

// ============================================================================
//  Shared Phase State
// ============================================================================

/// Running total of per-worker elapsed milliseconds.
///
/// Many workers add to it concurrently; every add is a single `fetch_add`,
/// so no update is lost.
#[derive(Debug, Default)]
pub struct ElapsedTotal {
    ms: AtomicU64,
}

impl ElapsedTotal {
    /// Create a zeroed total.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ms: AtomicU64::new(0),
        }
    }

    /// Add `ms` milliseconds.
    #[inline]
    pub fn add(&self, ms: u64) {
        self.ms.fetch_add(ms, RELAXED);
    }

    /// Current total.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.ms.load(RELAXED)
    }
}

/// Append-only log of worker ids.
#[derive(Debug, Default)]
pub struct OrderLog {
    ids: Mutex<Vec<usize>>,
}

impl OrderLog {
    /// Create a log with room for `capacity` ids.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Append `id`.
    #[inline]
    pub fn record(&self, id: usize) {
        self.ids.lock().push(id);
    }

    /// Consume the log, returning ids in append order.
    #[must_use]
    pub fn into_ids(self) -> Vec<usize> {
        self.ids.into_inner()
    }
}

/// Whole milliseconds of `duration`, saturating.
#[must_use]
pub fn whole_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
//  Fill Phase
// ============================================================================

/// Key with two fresh random v4 UUIDs and the fixed tags.
#[must_use]
pub fn random_key(language: &Arc<str>, database: &Arc<str>) -> CompositeKey {
    CompositeKey::new(
        Uuid::new_v4().hyphenated().to_string(),
        Uuid::new_v4().hyphenated().to_string(),
        Arc::clone(language),
        Arc::clone(database),
    )
}

/// Insert `items` freshly generated keys with value `false`.
///
/// Logs progress whenever the insertion index is a multiple of
/// `progress_interval`, starting at index 0.
///
/// # Panics
///
/// Panics if `progress_interval` is zero.
pub fn fill<S: BuildHasher>(map: &CacheMap<S>, items: usize, progress_interval: usize) -> FillReport {
    assert!(progress_interval > 0, "progress interval must be at least 1");

    let language: Arc<str> = Arc::from(LANGUAGE_TAG);
    let database: Arc<str> = Arc::from(DATABASE_TAG);
    let mut guard = map.guard();

    tracing::info!(items, "filling up the map");
    let timer: Instant = Instant::now();
    let mut inserted: usize = 0;

    for index in 0..items {
        let key: CompositeKey = random_key(&language, &database);
        if map.try_insert_with_guard(key, false, &guard) {
            inserted += 1;
        }
        // Lets the collector free tables retired by growth during the fill.
        guard.refresh();

        if index % progress_interval == 0 {
            tracing::info!(added = index, "fill progress");
        }
    }

    let elapsed: Duration = timer.elapsed();
    tracing::info!(inserted, ms = whole_ms(elapsed), "map filled");

    FillReport { inserted, elapsed }
}

// ============================================================================
//  Measurement Phase
// ============================================================================

/// State shared by every worker of one phase.
struct PhaseShared {
    start_order: OrderLog,
    completion_order: OrderLog,
    elapsed_total: ElapsedTotal,
}

/// Body of one reader thread.
fn run_worker<K, V, S>(
    id: usize,
    map: &ConcurrentMap<K, V, S>,
    strategy: ReadStrategy,
    shared: &PhaseShared,
) -> WorkerRecord
where
    K: Hash + Eq,
    V: Clone,
    S: BuildHasher,
{
    shared.start_order.record(id);
    let timer: Instant = Instant::now();
    tracing::info!(worker = id, %strategy, "iterating over map values");

    let guard = map.guard();
    let values = strategy.read(map, &guard);
    let retrieve: Duration = timer.elapsed();
    tracing::info!(worker = id, ms = whole_ms(retrieve), "values retrieved");

    let mut retrieved: usize = 0;
    for value in values {
        std::hint::black_box(value);
        retrieved += 1;
    }

    shared.completion_order.record(id);
    let elapsed: Duration = timer.elapsed();
    let elapsed_ms: u64 = whole_ms(elapsed);
    shared.elapsed_total.add(elapsed_ms);
    tracing::info!(worker = id, ms = elapsed_ms, retrieved, "iteration finished");

    WorkerRecord {
        id,
        retrieve,
        elapsed,
        elapsed_ms,
        retrieved,
    }
}

/// Run one measurement phase: `threads` concurrent readers using `strategy`.
///
/// Every spawned worker is joined before this returns, even on error.
///
/// # Errors
///
/// - [`Error::Spawn`] if a thread could not be started.
/// - [`Error::WorkerPanicked`] if a worker panicked (the first one by join order).
#[tracing::instrument(level = "info", skip_all, fields(strategy = %strategy, threads = threads))]
pub fn run_phase<K, V, S>(
    map: &ConcurrentMap<K, V, S>,
    strategy: ReadStrategy,
    threads: usize,
) -> Result<PhaseReport>
where
    K: Hash + Eq + Send + Sync,
    V: Clone + Send + Sync,
    S: BuildHasher + Sync,
{
    let shared: PhaseShared = PhaseShared {
        start_order: OrderLog::with_capacity(threads),
        completion_order: OrderLog::with_capacity(threads),
        elapsed_total: ElapsedTotal::new(),
    };

    let timer: Instant = Instant::now();
    let joined: Result<Vec<WorkerRecord>> = thread::scope(|scope| {
        let shared: &PhaseShared = &shared;
        let mut handles = Vec::with_capacity(threads);
        let mut first_error: Option<Error> = None;

        for id in 0..threads {
            let spawned = thread::Builder::new()
                .name(format!("reader-{id:03}"))
                .spawn_scoped(scope, move || run_worker(id, map, strategy, shared));

            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    tracing::error!(worker = id, error = %source, "failed to spawn reader");
                    first_error = Some(Error::Spawn { id, source });
                    break;
                }
            }
        }

        let mut records: Vec<WorkerRecord> = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.join() {
                Ok(record) => records.push(record),
                Err(_) => {
                    tracing::error!(worker = id, "reader panicked");
                    first_error.get_or_insert(Error::WorkerPanicked { id });
                }
            }
        }

        first_error.map_or(Ok(records), Err)
    });
    let total: Duration = timer.elapsed();

    let mut workers: Vec<WorkerRecord> = joined?;
    workers.sort_unstable_by_key(|record| record.id);

    let report: PhaseReport = PhaseReport {
        strategy,
        total,
        start_order: shared.start_order.into_ids(),
        completion_order: shared.completion_order.into_ids(),
        workers,
        elapsed_sum_ms: shared.elapsed_total.total(),
    };
    tracing::info!(
        total_ms = whole_ms(total),
        mean_ms = report.mean_ms(),
        "phase finished"
    );
    Ok(report)
}

// ============================================================================
//  Harness
// ============================================================================

/// Drives a full run against a borrowed map.
///
/// `P` decides how the run waits between phases, `W` receives the banner and
/// summary blocks. Per-worker progress goes to `tracing`.
pub struct Harness<'m, P, W, S = RandomState> {
    map: &'m CacheMap<S>,
    config: BenchConfig,
    pause: P,
    out: W,
}

impl<'m, P, W, S> Harness<'m, P, W, S>
where
    P: Pause,
    W: Write,
    S: BuildHasher + Sync,
{
    /// Create a harness over `map`.
    pub const fn new(map: &'m CacheMap<S>, config: BenchConfig, pause: P, out: W) -> Self {
        Self {
            map,
            config,
            pause,
            out,
        }
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Consume the harness, returning its pause and output.
    pub fn into_parts(self) -> (P, W) {
        (self.pause, self.out)
    }

    /// Banner, fill, one phase per strategy, comparison.
    ///
    /// Pauses before the fill, before each phase and before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, console I/O fails,
    /// or a phase fails (see [`run_phase`]).
    pub fn run(&mut self) -> Result<RunReport> {
        self.config.validate()?;

        report::write_banner(&mut self.out, &self.config)?;
        self.wait()?;

        let fill: FillReport = fill(self.map, self.config.items, self.config.progress_interval);

        let mut phases: Vec<PhaseReport> = Vec::with_capacity(ReadStrategy::ALL.len());
        for strategy in ReadStrategy::ALL {
            report::write_phase_header(&mut self.out, strategy)?;
            self.wait()?;

            let phase: PhaseReport = run_phase(self.map, strategy, self.config.threads)?;
            report::write_phase(&mut self.out, &phase)?;
            phases.push(phase);
        }

        let run: RunReport = RunReport { fill, phases };
        report::write_comparison(&mut self.out, &run)?;
        self.wait()?;

        Ok(run)
    }

    fn wait(&mut self) -> Result<()> {
        self.out.flush()?;
        self.pause.wait(CONTINUE_PROMPT)?;
        Ok(())
    }
}
