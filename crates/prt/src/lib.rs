//! prt: a parallel batch ray tracer over one shared-memory arena.
//!
//! This is the top-level crate. It re-exports the execution core and its
//! building blocks, and carries the pieces of the `prt` binary: the
//! command line, logging setup, and the flat-shade rendering backend.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//! use prt::prelude::*;
//! use prt::backend::FlatShade;
//!
//! let config = RunConfig {
//!     workers: 4,
//!     ..RunConfig::default()
//! };
//! let mut backend = FlatShade::new();
//! let report = run(&config, Path::new("scenes/balls.env"), &mut backend)?;
//! println!("{report}");
//! # Ok::<(), RunError>(())
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `prt-arena` | Global arena and exclusively owned regions |
//! | [`types`] | `prt-core` | Worker and ray ids, scene errors |
//! | [`engine`] | `prt-engine` | Barrier, shared state, lifecycle, statistics |
//! | [`backend`] | | Flat-shade renderer |
//! | [`cli`] | | Command-line definition |
//! | [`logging`] | | `tracing-subscriber` setup |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod cli;
pub mod logging;

/// Global arena and regions (`prt-arena`).
pub use prt_arena as arena;

/// Identifiers and scene errors (`prt-core`).
pub use prt_core as types;

/// Execution core (`prt-engine`).
///
/// [`engine::run`] drives one render; [`engine::SceneSetup`] and
/// [`engine::WorkerBackend`] are the collaborator traits to implement.
pub use prt_engine as engine;

/// Common imports for driving a render.
///
/// ```rust
/// use prt::prelude::*;
/// ```
pub mod prelude {
    // Arena
    pub use prt_arena::{ArenaConfig, ArenaError, ArenaRegion, GlobalArena};

    // Ids and errors
    pub use prt_core::{RayId, SceneError, WorkerId};

    // Engine
    pub use prt_engine::{
        run, ErrorKind, GeometrySummary, RunConfig, RunError, RunReport, SceneDescriptor,
        SceneSetup, SharedState, WorkerBackend, MAX_WORKERS,
    };
}
