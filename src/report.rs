//! Filepath: src/report.rs
//!
//! Results of a benchmark run and their console rendering.
//!
//! The harness fills in these types; the `write_*` functions and `Display`
//! impls turn them into the text the binary prints between pause points.

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

use crate::config::BenchConfig;
use crate::strategy::ReadStrategy;

const RULE: &str =
    " ------------------------------------------------------------------------------------------";

/// Separator used when joining worker ids into an order string.
pub const ORDER_SEPARATOR: &str = " , ";

/// Outcome of the fill phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillReport {
    /// Keys newly added to the map.
    pub inserted: usize,
    /// Wall-clock time of the whole fill phase.
    pub elapsed: Duration,
}

/// What one reader thread observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRecord {
    /// Worker id, `0..threads`.
    pub id: usize,
    /// Time until the strategy returned its value sequence.
    pub retrieve: Duration,
    /// Time of retrieval plus full iteration.
    pub elapsed: Duration,
    /// `elapsed` in whole milliseconds; the amount added to the phase total.
    pub elapsed_ms: u64,
    /// Number of values iterated.
    pub retrieved: usize,
}

/// Aggregated results of one measurement phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    /// Strategy every worker used.
    pub strategy: ReadStrategy,
    /// Phase wall-clock time, from first spawn to last join.
    pub total: Duration,
    /// Worker ids in the order they started running.
    pub start_order: Vec<usize>,
    /// Worker ids in the order they finished iterating.
    pub completion_order: Vec<usize>,
    /// Per-worker records, sorted by id.
    pub workers: Vec<WorkerRecord>,
    /// Sum of every worker's `elapsed_ms`.
    pub elapsed_sum_ms: u64,
}

impl PhaseReport {
    /// Number of workers that ran.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Phase wall-clock time in whole milliseconds.
    #[must_use]
    pub fn total_ms(&self) -> u128 {
        self.total.as_millis()
    }

    /// Mean per-worker time, truncated to whole milliseconds.
    ///
    /// Zero when no worker ran.
    #[must_use]
    pub fn mean_ms(&self) -> u64 {
        match u64::try_from(self.threads()) {
            Ok(0) | Err(_) => 0,
            Ok(threads) => self.elapsed_sum_ms / threads,
        }
    }
}

impl fmt::Display for PhaseReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, " STRATEGY : {}", self.strategy)?;
        writeln!(f, " TOTAL PROCESSING TIME : {} [ms]", self.total_ms())?;
        writeln!(f)?;
        writeln!(f, " Initial order of worker start : {}", join_order(&self.start_order))?;
        writeln!(f, " Order of worker completion : {}", join_order(&self.completion_order))?;
        writeln!(f)?;
        writeln!(f, " Average execution time : {} [ms]", self.mean_ms())?;
        writeln!(f)?;
        write!(f, "{RULE}")
    }
}

/// Everything a full run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Fill phase outcome.
    pub fill: FillReport,
    /// One report per strategy, in measurement order.
    pub phases: Vec<PhaseReport>,
}

impl RunReport {
    /// Report of the phase that measured `strategy`, if it ran.
    #[must_use]
    pub fn phase(&self, strategy: ReadStrategy) -> Option<&PhaseReport> {
        self.phases.iter().find(|phase| phase.strategy == strategy)
    }
}

/// Join worker ids with [`ORDER_SEPARATOR`].
#[must_use]
pub fn join_order(ids: &[usize]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(ORDER_SEPARATOR)
}

/// Print the explanatory banner and the run parameters.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_banner<W: Write>(out: &mut W, config: &BenchConfig) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        " Time to read every value of a concurrent map, comparing two methods."
    )?;
    writeln!(out)?;
    writeln!(out, " one that LOCKS other threads :")?;
    writeln!(out, "   -> {}", ReadStrategy::Snapshot.describe())?;
    writeln!(out)?;
    writeln!(out, " and one that does NOT lock other threads :")?;
    writeln!(out, "   -> {}", ReadStrategy::Projection.describe())?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;
    writeln!(out, " NUMBER OF ENTRIES IN MAP : {}", config.items)?;
    writeln!(out, " NUMBER OF THREADS : {}", config.threads)?;
    writeln!(out)
}

/// Print the header shown before a measurement phase.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_phase_header<W: Write>(out: &mut W, strategy: ReadStrategy) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Iterate over map values using   {}   :", strategy.describe())
}

/// Print a phase summary block.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_phase<W: Write>(out: &mut W, phase: &PhaseReport) -> io::Result<()> {
    writeln!(out, "{phase}")
}

/// Print how the projection phase compared to the snapshot phase.
///
/// Prints nothing unless both phases ran.
///
/// # Errors
///
/// Returns any error from `out`.
pub fn write_comparison<W: Write>(out: &mut W, run: &RunReport) -> io::Result<()> {
    let (Some(snapshot), Some(projection)) = (
        run.phase(ReadStrategy::Snapshot),
        run.phase(ReadStrategy::Projection),
    ) else {
        return Ok(());
    };

    let (locked, unlocked) = (snapshot.total_ms(), projection.total_ms());
    writeln!(out)?;
    match unlocked.cmp(&locked) {
        std::cmp::Ordering::Less => writeln!(
            out,
            " {} was {} [ms] faster than {} ({unlocked} vs {locked} [ms])",
            ReadStrategy::Projection,
            locked - unlocked,
            ReadStrategy::Snapshot,
        ),
        std::cmp::Ordering::Greater => writeln!(
            out,
            " {} was {} [ms] slower than {} ({unlocked} vs {locked} [ms])",
            ReadStrategy::Projection,
            unlocked - locked,
            ReadStrategy::Snapshot,
        ),
        std::cmp::Ordering::Equal => writeln!(
            out,
            " {} and {} took the same time ({locked} [ms])",
            ReadStrategy::Projection,
            ReadStrategy::Snapshot,
        ),
    }
}
