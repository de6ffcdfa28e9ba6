//! Benchmark profiles for prt.
//!
//! Shared setup for the criterion benches. Every [`GlobalArena`] keeps its
//! reservation until process exit, so benches build one arena per profile
//! and churn inside it rather than creating arenas per iteration.

#![deny(missing_docs)]
#![forbid(unsafe_code)]

use prt_arena::{ArenaConfig, ArenaError, GlobalArena};
use prt_engine::{ConfigError, RunConfig, SharedState};

/// Worker counts exercised by the concurrent benches.
pub const WORKER_COUNTS: [usize; 4] = [1, 4, 16, 64];

/// Arena of `megabytes` for a bench profile.
pub fn arena(megabytes: usize) -> Result<GlobalArena, ArenaError> {
    GlobalArena::init(ArenaConfig::from_megabytes(megabytes)?)
}

/// Shared state for `workers` over a fresh arena of `megabytes`.
pub fn shared_state(workers: usize, megabytes: usize) -> Result<SharedState, ConfigError> {
    let config = RunConfig {
        arena_megabytes: megabytes,
        ..RunConfig::with_workers(workers)
    };
    let arena = GlobalArena::init(config.arena_config()?)?;
    SharedState::new(&config, arena)
}

/// Deterministic allocation sizes for arena churn.
///
/// Sizes fall in `[16, 4096)` bytes.
pub fn churn_sizes(count: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            16 + (state >> 33) as usize % 4080
        })
        .collect()
}
