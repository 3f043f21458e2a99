#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

pub use ripcord::test_utils::init_test_logging;

use std::time::Duration;

/// Span covered by the register-vs-cancel interleaving sweep.
pub const DEFAULT_SWEEP_SPAN_US: u64 = 20_000;
/// Step between sweep delays.
pub const DEFAULT_SWEEP_STEP_US: u64 = 500;

const SWEEP_SPAN_ENV: &str = "RIPCORD_SWEEP_SPAN_US";
const SWEEP_STEP_ENV: &str = "RIPCORD_SWEEP_STEP_US";

/// Generous upper bound for "the worker exits promptly".
pub const EXIT_DEADLINE: Duration = Duration::from_secs(3);

/// Sweep span, overridable via `RIPCORD_SWEEP_SPAN_US`.
#[must_use]
pub fn sweep_span() -> Duration {
    Duration::from_micros(read_env_u64(SWEEP_SPAN_ENV).unwrap_or(DEFAULT_SWEEP_SPAN_US))
}

/// Sweep step, overridable via `RIPCORD_SWEEP_STEP_US`.
#[must_use]
pub fn sweep_step() -> Duration {
    Duration::from_micros(
        read_env_u64(SWEEP_STEP_ENV)
            .unwrap_or(DEFAULT_SWEEP_STEP_US)
            .max(1),
    )
}

fn read_env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}

use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;

const PROPTEST_SEED_ENV: &str = "RIPCORD_PROPTEST_SEED";

/// Build a ProptestConfig honoring a fixed seed from the environment so
/// failures reproduce across runs.
#[must_use]
pub fn proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    if matches!(config.rng_seed, RngSeed::Random) {
        if let Some(seed) = read_env_u64(PROPTEST_SEED_ENV) {
            config.rng_seed = RngSeed::Fixed(seed);
        }
    }
    config
}
