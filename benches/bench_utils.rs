//! Shared helpers for benchmarks.
//!
//! Goals:
//! - Keep key generation deterministic across benches and runs.
//! - Share the two fixed tag strings between keys, like the fill phase does.

#![allow(dead_code)]

use std::fmt::Write;
use std::sync::Arc;

use valuescan::harness::{DATABASE_TAG, LANGUAGE_TAG};
use valuescan::key::CompositeKey;

const MULTIPLIERS: [u64; 4] = [
    0x517c_c1b7_2722_0a95,
    0x9e37_79b9_7f4a_7c15,
    0xbf58_476d_1ce4_e5b9,
    0x94d0_49bb_1331_11eb,
];

/// Format `i` as a UUID-shaped hex string, mixed by `salt`.
fn uuid_like(i: u64, salt: usize) -> String {
    let hi: u64 = i.wrapping_mul(MULTIPLIERS[salt % 4]);
    let lo: u64 = (i ^ hi).wrapping_mul(MULTIPLIERS[(salt + 1) % 4]);

    let mut out = String::with_capacity(36);
    let _ = write!(
        out,
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        hi >> 32,
        (hi >> 16) & 0xffff,
        hi & 0xffff,
        lo >> 48,
        lo & 0xffff_ffff_ffff
    );
    out
}

/// Deterministically generate `n` distinct composite keys with the fixed tags.
pub fn composite_keys(n: usize) -> Vec<CompositeKey> {
    let language: Arc<str> = Arc::from(LANGUAGE_TAG);
    let database: Arc<str> = Arc::from(DATABASE_TAG);

    (0..n as u64)
        .map(|i| {
            CompositeKey::new(
                format!("{i:08}-{}", uuid_like(i, 0)),
                uuid_like(i, 2),
                Arc::clone(&language),
                Arc::clone(&database),
            )
        })
        .collect()
}
