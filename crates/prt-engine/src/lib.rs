//! Parallel execution core of the prt ray tracer.
//!
//! A fixed pool of worker threads renders one scene cooperatively. They
//! share a single preallocated arena and one [`SharedState`], meet once at
//! a start barrier after private initialization, and then run
//! independently until they are joined.
//!
//! # Architecture
//!
//! ```text
//! run()
//! ├── RunConfig::validate        before anything is allocated
//! ├── GlobalArena::init          one reservation for the whole run
//! ├── SharedState::new           id/ray locks, barrier, pool slots, timings
//! ├── SceneSetup                 load scene + geometry, open output, build
//! ├── lifecycle::launch          N-1 scoped threads + the calling thread
//! │   └── bootstrap::run_worker  id → timer → init → barrier → render → record
//! ├── SceneSetup::close_output
//! └── RunReport::aggregate       min / max / avg, with and without init
//! ```
//!
//! Rendering itself is external: implement [`SceneSetup`] and
//! [`WorkerBackend`] and pass the implementation to [`run()`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod barrier;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod run;
pub mod shared;
pub mod stats;

pub use backend::{GeometrySummary, SceneDescriptor, SceneSetup, WorkerBackend};
pub use barrier::{BarrierAborted, BarrierWait, StartBarrier};
pub use config::{ConfigError, RunConfig, MAX_WORKERS};
pub use error::{ErrorKind, RunError};
pub use lifecycle::launch;
pub use run::run;
pub use shared::{SharedState, TimingTable};
pub use stats::{RunReport, WorkerTimingSummary};
