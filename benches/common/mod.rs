//! Shared configuration and input generation for the forest benchmarks.
//!
//! Every input is derived from a fixed seed so runs are comparable across machines and commits.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use seg_forest::Value;

// CONFIG
// ================================================================================================

/// Default measurement time for most benchmarks
pub const DEFAULT_MEASUREMENT_TIME: Duration = Duration::from_secs(10);

/// Sample size for statistical significance
pub const DEFAULT_SAMPLE_SIZE: usize = 50;

/// Array lengths every benchmark is run against
pub const ARRAY_SIZES: &[usize] = &[
    1_024,     // fits in cache
    65_536,    // 2^16
    1_000_000, // not a power of two, uneven leaf depths
];

/// Number of operations timed per iteration in the batched benchmarks
pub const OPS_PER_ITERATION: usize = 256;

const SEED: [u8; 32] = [7; 32];

// DATA
// ================================================================================================

pub fn rng() -> ChaCha20Rng {
    ChaCha20Rng::from_seed(SEED)
}

/// Generates `size` values in `[-1000, 1000)`.
pub fn generate_values(size: usize) -> Vec<Value> {
    let mut rng = rng();
    (0..size).map(|_| rng.gen_range(-1_000..1_000)).collect()
}

/// Generates `count` index/value pairs addressed to an array of `size` elements.
pub fn generate_updates(size: usize, count: usize) -> Vec<(usize, Value)> {
    let mut rng = rng();
    (0..count).map(|_| (rng.gen_range(0..size), rng.gen_range(-1_000..1_000))).collect()
}

/// Generates `count` inclusive ranges inside an array of `size` elements.
pub fn generate_ranges(size: usize, count: usize) -> Vec<(usize, usize)> {
    let mut rng = rng();
    (0..count)
        .map(|_| {
            let a = rng.gen_range(0..size);
            let b = rng.gen_range(0..size);
            (a.min(b), a.max(b))
        })
        .collect()
}
