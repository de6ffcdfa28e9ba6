//! Run configuration, validation, and error types.
//!
//! [`RunConfig`] is the already-parsed input to a render. [`validate()`]
//! runs before the arena is reserved or any worker exists, so a
//! configuration error never leaves partial state behind.
//!
//! [`validate()`]: RunConfig::validate

use prt_arena::{ArenaConfig, ArenaError};
use thiserror::Error;

/// Upper bound on the number of workers in one run.
pub const MAX_WORKERS: usize = 64;

// ── RunConfig ──────────────────────────────────────────────────────

/// Parameters of one render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of workers, including the one on the calling thread.
    /// Must lie in `[1, MAX_WORKERS]`. Default: 1.
    pub workers: usize,
    /// Arena capacity in megabytes. Default: 32.
    pub arena_megabytes: usize,
    /// Samples traced per pixel; more than one enables antialiasing.
    /// Default: 1.
    pub samples_per_pixel: u32,
    /// Time every worker, not just worker 0. Default: off.
    pub per_worker_stats: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            arena_megabytes: ArenaConfig::DEFAULT_MEGABYTES,
            samples_per_pixel: 1,
            per_worker_stats: false,
        }
    }
}

impl RunConfig {
    /// A default config running `workers` workers.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::WorkerCountOutOfRange {
                requested: self.workers,
                max: MAX_WORKERS,
            });
        }
        if self.arena_megabytes == 0 {
            return Err(ConfigError::EmptyArena);
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::NoSamples);
        }
        self.arena_config()?;
        Ok(())
    }

    /// The arena configuration implied by `arena_megabytes`.
    pub fn arena_config(&self) -> Result<ArenaConfig, ConfigError> {
        Ok(ArenaConfig::from_megabytes(self.arena_megabytes)?)
    }

    /// Whether more than one sample is traced per pixel.
    pub fn antialiasing(&self) -> bool {
        self.samples_per_pixel > 1
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by [`RunConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Worker count outside `[1, MAX_WORKERS]`.
    #[error("Valid range for #processors is [1, {max}]")]
    WorkerCountOutOfRange {
        /// The configured count.
        requested: usize,
        /// [`MAX_WORKERS`].
        max: usize,
    },
    /// Zero-megabyte arena.
    #[error("Global memory size must be at least 1 MB")]
    EmptyArena,
    /// Zero samples per pixel.
    #[error("Antialiasing requires at least 1 sample per pixel")]
    NoSamples,
    /// The arena size cannot be represented.
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.workers, 1);
        assert_eq!(config.arena_megabytes, 32);
        assert_eq!(config.samples_per_pixel, 1);
        assert!(!config.per_worker_stats);
        assert!(!config.antialiasing());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn worker_count_bounds() {
        assert!(RunConfig::with_workers(1).validate().is_ok());
        assert!(RunConfig::with_workers(MAX_WORKERS).validate().is_ok());
        for bad in [0, MAX_WORKERS + 1, 1000] {
            let err = RunConfig::with_workers(bad).validate().unwrap_err();
            assert_eq!(
                err,
                ConfigError::WorkerCountOutOfRange {
                    requested: bad,
                    max: MAX_WORKERS
                }
            );
            assert_eq!(err.to_string(), "Valid range for #processors is [1, 64]");
        }
    }

    #[test]
    fn zero_arena_and_zero_samples_rejected() {
        let config = RunConfig {
            arena_megabytes: 0,
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyArena));

        let config = RunConfig {
            samples_per_pixel: 0,
            ..RunConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoSamples));
    }

    #[test]
    fn oversized_arena_rejected() {
        let config = RunConfig {
            arena_megabytes: usize::MAX,
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Arena(ArenaError::CapacityOverflow { .. }))
        ));
    }

    #[test]
    fn arena_config_converts_megabytes() {
        let config = RunConfig {
            arena_megabytes: 2,
            ..RunConfig::default()
        };
        assert_eq!(config.arena_config().unwrap().capacity_bytes, 2 << 20);
    }
}
