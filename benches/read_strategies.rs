//! Benchmarks: snapshot read vs projected read under reader contention.
//!
//! Every iteration spawns `threads` readers that each read and iterate every
//! value of a pre-filled map, which is one measurement phase of the binary
//! without console output or pauses.
//!
//! Baselines:
//! - `dashmap::DashMap` - sharded `RwLock`s; `iter()` read-locks one shard at a time
//! - `papaya::HashMap` - lock-free; `pin().iter()` never blocks
//!
//! ```bash
//! cargo bench --bench read_strategies                          # default allocator
//! cargo bench --bench read_strategies --features mimalloc      # mimalloc
//! ```

mod bench_utils;

use dashmap::DashMap;
use divan::{Bencher, black_box};
use std::thread;
use valuescan::{CacheMap, CompositeKey, ConcurrentMap, ReadStrategy};

use bench_utils::composite_keys;

// Use alternative allocator if feature is enabled
#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() {
    divan::main();
}

// =============================================================================
// Setup Helpers
// =============================================================================

fn setup_map(keys: &[CompositeKey]) -> CacheMap {
    let map: CacheMap = ConcurrentMap::with_segments(64);
    for key in keys {
        map.try_insert(key.clone(), false);
    }
    map
}

fn setup_dashmap(keys: &[CompositeKey]) -> DashMap<CompositeKey, bool> {
    let map = DashMap::new();
    for key in keys {
        map.insert(key.clone(), false);
    }
    map
}

fn setup_papaya(keys: &[CompositeKey]) -> papaya::HashMap<CompositeKey, bool> {
    let map = papaya::HashMap::new();
    {
        let pinned = map.pin();
        for key in keys {
            pinned.insert(key.clone(), false);
        }
    }
    map
}

/// Spawn `threads` readers running `read` and join them all.
fn run_readers<F>(threads: usize, read: F)
where
    F: Fn() -> usize + Sync,
{
    thread::scope(|s| {
        let handles: Vec<_> = (0..threads).map(|_| s.spawn(&read)).collect();
        for h in handles {
            black_box(h.join().unwrap());
        }
    });
}

// =============================================================================
// 01: Single Reader
// =============================================================================

#[divan::bench_group(name = "01_single_reader")]
mod single_reader {
    use super::{Bencher, ReadStrategy, black_box, composite_keys, setup_map};

    const N: usize = 100_000;

    #[divan::bench]
    fn snapshot(bencher: Bencher) {
        let map = setup_map(&composite_keys(N));
        bencher.bench_local(|| {
            let guard = map.guard();
            black_box(ReadStrategy::Snapshot.read(&map, &guard).count())
        });
    }

    #[divan::bench]
    fn projection(bencher: Bencher) {
        let map = setup_map(&composite_keys(N));
        bencher.bench_local(|| {
            let guard = map.guard();
            black_box(ReadStrategy::Projection.read(&map, &guard).count())
        });
    }
}

// =============================================================================
// 02: Concurrent Readers Scaling
// =============================================================================

#[divan::bench_group(name = "02_concurrent_readers")]
mod concurrent_readers {
    use super::{
        Bencher, ReadStrategy, composite_keys, run_readers, setup_dashmap, setup_map, setup_papaya,
    };

    const N: usize = 50_000;

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn snapshot(bencher: Bencher, threads: usize) {
        let map = setup_map(&composite_keys(N));
        bencher.bench_local(|| {
            run_readers(threads, || {
                let guard = map.guard();
                ReadStrategy::Snapshot.read(&map, &guard).count()
            });
        });
    }

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn projection(bencher: Bencher, threads: usize) {
        let map = setup_map(&composite_keys(N));
        bencher.bench_local(|| {
            run_readers(threads, || {
                let guard = map.guard();
                ReadStrategy::Projection.read(&map, &guard).count()
            });
        });
    }

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn dashmap(bencher: Bencher, threads: usize) {
        let map = setup_dashmap(&composite_keys(N));
        bencher.bench_local(|| {
            run_readers(threads, || map.iter().map(|entry| *entry.value()).count());
        });
    }

    #[divan::bench(args = [1, 2, 4, 8, 16])]
    fn papaya(bencher: Bencher, threads: usize) {
        let map = setup_papaya(&composite_keys(N));
        bencher.bench_local(|| {
            run_readers(threads, || map.pin().iter().map(|(_, v)| *v).count());
        });
    }
}

// =============================================================================
// 03: Readers With A Concurrent Writer
// =============================================================================

#[divan::bench_group(name = "03_readers_with_writer")]
mod readers_with_writer {
    use super::{Bencher, ReadStrategy, black_box, composite_keys, setup_map, thread};

    const N: usize = 50_000;
    const WRITES: usize = 5_000;
    const READERS: usize = 8;

    fn bench(bencher: Bencher, strategy: ReadStrategy) {
        let keys = composite_keys(N + WRITES);
        let (base, extra) = keys.split_at(N);

        bencher
            .with_inputs(|| setup_map(base))
            .bench_local_values(|map| {
                thread::scope(|s| {
                    s.spawn(|| {
                        for key in extra {
                            map.try_insert(key.clone(), true);
                        }
                    });
                    for _ in 0..READERS {
                        s.spawn(|| {
                            let guard = map.guard();
                            black_box(strategy.read(&map, &guard).count());
                        });
                    }
                });
                map
            });
    }

    #[divan::bench]
    fn snapshot(bencher: Bencher) {
        bench(bencher, ReadStrategy::Snapshot);
    }

    #[divan::bench]
    fn projection(bencher: Bencher) {
        bench(bencher, ReadStrategy::Projection);
    }
}
