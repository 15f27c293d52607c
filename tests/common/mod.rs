//! Tracing for the harness integration tests.
//!
//! `init_tracing` installs one JSON subscriber per test binary. It captures
//! what a benchmark run emits:
//!
//! - `fill progress` / `map filled` events from the fill (`added`, `inserted`, `ms`)
//! - one `run_phase` span per measurement phase (`strategy`, `threads`)
//! - `iterating over map values` / `values retrieved` / `iteration finished`
//!   per reader thread (`worker`, `strategy`, `retrieved`, `ms`)
//! - `phase finished` with the phase's total and mean time
//!
//! Events are written to `target/valuescan-tests.jsonl` unless
//! `VALUESCAN_TEST_LOG` names another file. `RUST_LOG` filters as usual and
//! defaults to `valuescan=debug`.
//!
//! ```bash
//! # Mean reader time of every phase, in run order
//! jq 'select(.fields.message == "phase finished") | [.span.strategy, .fields.mean_ms]' \
//!     target/valuescan-tests.jsonl
//! ```

#![allow(dead_code)]

use std::env;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Mutex, Once};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

/// Install the test subscriber. Only the first call in a binary does anything.
pub fn init_tracing() {
    INIT.call_once(|| {
        let Some(file) = open_log() else {
            return;
        };

        let filter: EnvFilter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("valuescan=debug"));

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_thread_names(true)
            .json()
            .with_current_span(true)
            .with_filter(filter);

        // Another harness (e.g. a test runner) may already own the global slot.
        let _ = Registry::default().with(layer).try_init();
    });
}

fn log_path() -> PathBuf {
    env::var_os("VALUESCAN_TEST_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target").join("valuescan-tests.jsonl"))
}

/// Open the log for appending; tests still run when it cannot be created.
fn open_log() -> Option<File> {
    let path: PathBuf = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}
