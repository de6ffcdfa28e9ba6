//! Collaborator interfaces consumed by the execution core.
//!
//! The core never touches geometry, intersection, or image formats. It
//! drives two narrow traits instead:
//!
//! - [`SceneSetup`]: single-threaded steps that bracket the run (scene and
//!   geometry loading, acceleration-structure construction, output).
//! - [`WorkerBackend`]: the per-worker hooks invoked by every worker's
//!   bootstrap sequence, concurrently, through a shared reference.

use std::path::{Path, PathBuf};

use prt_core::WorkerId;

use crate::error::RunError;
use crate::shared::SharedState;

/// What [`SceneSetup::load_scene`] learned from the scene description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneDescriptor {
    /// Geometry file to pass to [`SceneSetup::load_geometry`].
    pub geometry: PathBuf,
    /// Output file to pass to [`SceneSetup::close_output`].
    pub output: PathBuf,
}

/// Counts reported by [`SceneSetup::load_geometry`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GeometrySummary {
    /// Number of primitive objects.
    pub objects: usize,
    /// Number of primitive elements.
    pub elements: usize,
}

/// Single-threaded scene collaborators.
///
/// Every method runs before the first worker is spawned or after the last
/// one has joined, so implementations may mutate freely.
pub trait SceneSetup {
    /// Parse the scene description at `path`.
    fn load_scene(&mut self, path: &Path, shared: &SharedState)
        -> Result<SceneDescriptor, RunError>;

    /// Load the geometry named by the scene description.
    fn load_geometry(&mut self, path: &Path, shared: &SharedState)
        -> Result<GeometrySummary, RunError>;

    /// Preprocess the loaded geometry. Must finish before any worker
    /// starts, since rendering reads what it builds.
    fn build_acceleration_structure(&mut self, shared: &SharedState) -> Result<(), RunError>;

    /// Prepare the output target.
    fn open_output(&mut self, shared: &SharedState) -> Result<(), RunError>;

    /// Flush and close the output at `path`.
    fn close_output(&mut self, path: &Path) -> Result<(), RunError>;
}

/// Per-worker collaborators, shared by every worker thread.
pub trait WorkerBackend: Sync {
    /// Private ray-tree stack built for one worker and used only by it.
    type RayStack;

    /// Maximum recursion depth used to size each ray-tree stack.
    fn max_ray_depth(&self) -> u32;

    /// Allocate and fill `worker`'s work pool from the arena.
    fn init_work_pool(&self, worker: WorkerId, shared: &SharedState) -> Result<(), RunError>;

    /// Allocate `worker`'s ray-tree stack, sized by `max_depth`.
    fn init_ray_stack(
        &self,
        max_depth: u32,
        worker: WorkerId,
        shared: &SharedState,
    ) -> Result<Self::RayStack, RunError>;

    /// Render until no work remains. Runs only after every worker has
    /// finished initialization.
    fn render(&self, worker: WorkerId, shared: &SharedState, stack: &mut Self::RayStack);
}
