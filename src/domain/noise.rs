//! Repeatable noise streams.
//!
//! Every step gets its own generator, seeded from the run seed mixed with the step index, so the
//! noise of step `n` does not depend on how many samples earlier steps drew. Independent
//! consumers (odometry, laser) use separate ChaCha streams of the same seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

pub const ODOMETRY_STREAM: u64 = 1;
pub const LASER_STREAM: u64 = 2;

pub fn step_rng(seed: u64, stream: u64, step: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ step.wrapping_mul(MIXING_CONSTANT));
    rng.set_stream(stream);
    rng
}

/// Uniform sample in `[-limit, limit]`; zero for non-positive limits.
pub fn symmetric(rng: &mut ChaCha8Rng, limit: f64) -> f64 {
    if limit > 0.0 {
        rng.random_range(-limit..=limit)
    } else {
        0.0
    }
}
