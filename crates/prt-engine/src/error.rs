//! Run-level error type and its classification.

use std::io;

use prt_arena::ArenaError;
use prt_core::{SceneError, WorkerId};
use thiserror::Error;

use crate::config::ConfigError;

/// Every fault a render can surface. None of them is recoverable: the
/// caller reports the error and exits.
#[derive(Debug, Error)]
pub enum RunError {
    /// The run configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The arena could not be reserved or is exhausted.
    #[error(transparent)]
    Arena(#[from] ArenaError),
    /// A scene, geometry, or output file failed.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// The OS refused to create a worker thread.
    #[error("Cannot create worker {index}: {source}")]
    Spawn {
        /// Spawn-loop index of the worker that failed.
        index: usize,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// More workers asked for an id than were configured.
    #[error("worker id requested beyond the {worker_count} configured workers")]
    WorkerIdsExhausted {
        /// The configured worker count.
        worker_count: usize,
    },
    /// A worker recorded its elapsed time twice.
    #[error("timing slot of worker {worker} written twice")]
    TimingSlotRewritten {
        /// Owner of the slot.
        worker: WorkerId,
    },
    /// Another worker failed before reaching the start barrier.
    #[error("start barrier aborted before all workers arrived")]
    StartAborted,
    /// A worker thread panicked.
    #[error("worker thread '{name}' panicked")]
    WorkerPanicked {
        /// Thread name.
        name: String,
    },
}

/// Coarse classification of a [`RunError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid option or out-of-range value; detected before any shared
    /// state exists.
    Configuration,
    /// The arena or the OS ran out of something.
    ResourceExhaustion,
    /// A collaborator's file could not be read or written.
    External,
    /// A broken invariant inside the core.
    Internal,
}

impl RunError {
    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Config(_) => ErrorKind::Configuration,
            RunError::Arena(ArenaError::InvalidConfig { .. })
            | RunError::Arena(ArenaError::CapacityOverflow { .. }) => ErrorKind::Configuration,
            RunError::Arena(ArenaError::ForeignRegion { .. }) => ErrorKind::Internal,
            RunError::Arena(_) | RunError::Spawn { .. } => ErrorKind::ResourceExhaustion,
            RunError::Scene(_) => ErrorKind::External,
            RunError::WorkerIdsExhausted { .. }
            | RunError::TimingSlotRewritten { .. }
            | RunError::StartAborted
            | RunError::WorkerPanicked { .. } => ErrorKind::Internal,
        }
    }

    /// Whether this error only reports that some other worker failed first.
    pub fn is_secondary(&self) -> bool {
        matches!(self, RunError::StartAborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let config: RunError = ConfigError::NoSamples.into();
        assert_eq!(config.kind(), ErrorKind::Configuration);

        let exhausted: RunError = ArenaError::Exhausted {
            requested: 1,
            remaining: 0,
            capacity: 16,
        }
        .into();
        assert_eq!(exhausted.kind(), ErrorKind::ResourceExhaustion);

        let spawn = RunError::Spawn {
            index: 3,
            source: io::Error::from(io::ErrorKind::OutOfMemory),
        };
        assert_eq!(spawn.kind(), ErrorKind::ResourceExhaustion);
        assert!(spawn.to_string().starts_with("Cannot create worker 3"));

        let scene: RunError = SceneError::OutputNotOpen.into();
        assert_eq!(scene.kind(), ErrorKind::External);

        assert_eq!(RunError::StartAborted.kind(), ErrorKind::Internal);
        assert!(RunError::StartAborted.is_secondary());
        assert!(!spawn.is_secondary());
    }

    #[test]
    fn transparent_messages_pass_through() {
        let err: RunError = ConfigError::WorkerCountOutOfRange {
            requested: 0,
            max: 64,
        }
        .into();
        assert_eq!(err.to_string(), "Valid range for #processors is [1, 64]");
    }
}
