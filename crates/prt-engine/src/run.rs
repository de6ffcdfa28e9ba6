//! Run driver: one render from configuration to report.

use std::path::Path;
use std::time::{Instant, SystemTime};

use prt_arena::GlobalArena;
use tracing::{debug, info, info_span};

use crate::backend::{SceneSetup, WorkerBackend};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::lifecycle;
use crate::shared::SharedState;
use crate::stats::RunReport;

/// Render the scene at `scene_path` with `config.workers` workers.
///
/// Order of operations: validate `config`, reserve the arena, build the
/// shared state, load the scene and its geometry, open the output, build
/// the acceleration structure, run every worker, close the output, and
/// aggregate the timings. Configuration errors are reported before the
/// arena is reserved.
///
/// Each call reserves a fresh [`GlobalArena`](prt_arena::GlobalArena) of
/// `config.arena_megabytes` that is not returned to the OS before the
/// process exits. Long-lived callers that render repeatedly should size
/// the arena accordingly.
pub fn run<B>(config: &RunConfig, scene_path: &Path, backend: &mut B) -> Result<RunReport, RunError>
where
    B: SceneSetup + WorkerBackend,
{
    let _span = info_span!("run", workers = config.workers).entered();
    config.validate()?;

    let arena = GlobalArena::init(config.arena_config()?)?;
    let shared = SharedState::new(config, arena)?;

    let scene = backend.load_scene(scene_path, &shared)?;
    debug!(geometry = %scene.geometry.display(), output = %scene.output.display(), "scene loaded");
    let geometry = backend.load_geometry(&scene.geometry, &shared)?;
    info!(
        objects = geometry.objects,
        elements = geometry.elements,
        "geometry loaded"
    );
    backend.open_output(&shared)?;
    backend.build_acceleration_structure(&shared)?;

    let started_at = SystemTime::now();
    let spawned_at = Instant::now();
    lifecycle::launch(&shared, &*backend)?;
    let joined_at = Instant::now();
    let finished_at = SystemTime::now();

    backend.close_output(&scene.output)?;

    let report = RunReport::aggregate(
        &shared,
        geometry,
        (started_at, finished_at),
        spawned_at,
        joined_at,
    );
    info!(
        elapsed_ms = report.with_initialization.as_secs_f64() * 1e3,
        rays = report.rays_issued,
        arena_peak = report.arena.peak,
        "render complete"
    );
    Ok(report)
}
