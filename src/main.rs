//! `valuescan` binary: interactive snapshot-vs-projection read benchmark.
//!
//! Run with:
//! ```bash
//! cargo run --release -- --items 3000000 --threads 100
//! RUST_LOG=valuescan=debug cargo run --release --features trace-internals -- --no-pause
//! ```

use std::io;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use valuescan::{Args, BenchConfig, CacheMap, ConcurrentMap, Harness, LogFormat, NoPause, StdinPause};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Install the global subscriber. `RUST_LOG` overrides the `info` default.
fn init_tracing(format: LogFormat) {
    let filter: EnvFilter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = match format {
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_writer(io::stderr)
            .compact()
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_writer(io::stderr)
            .json()
            .boxed(),
    };

    if let Err(err) = Registry::default().with(layer.with_filter(filter)).try_init() {
        eprintln!("valuescan: tracing subscriber not installed: {err}");
    }
}

fn build_map(config: &BenchConfig) -> CacheMap {
    match config.segments {
        Some(segments) => ConcurrentMap::with_segments(segments),
        None => ConcurrentMap::new(),
    }
}

fn main() -> Result<(), valuescan::Error> {
    let args: Args = Args::parse();
    init_tracing(args.log_format);

    let config: BenchConfig = args.bench_config()?;
    let map: CacheMap = build_map(&config);
    tracing::info!(
        items = config.items,
        threads = config.threads,
        segments = map.segment_count(),
        "starting run"
    );

    let stdout = io::stdout();
    let run = if args.no_pause {
        Harness::new(&map, config, NoPause, stdout.lock()).run()?
    } else {
        Harness::new(&map, config, StdinPause, stdout.lock()).run()?
    };

    tracing::info!(inserted = run.fill.inserted, phases = run.phases.len(), "run complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_tracing_init_is_reported_not_fatal() {
        init_tracing(LogFormat::Compact);
        // The global subscriber is already set; this reaches the error branch.
        init_tracing(LogFormat::Json);
        tracing::info!("still logging");
    }
}
