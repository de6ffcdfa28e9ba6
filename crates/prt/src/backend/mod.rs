//! Flat-shade rendering backend.
//!
//! A deterministic stand-in for a full intersection pipeline. It drives the
//! execution core through every collaborator hook with real arena traffic:
//!
//! - the environment file names the geometry, output, and image layout;
//! - geometry bytes are copied into the arena and digested into a shading
//!   seed, in place of building a spatial hierarchy;
//! - bundles of pixels are dealt to per-worker pools and stolen when a
//!   worker runs dry;
//! - each sample walks a binary ray tree on the worker's arena-backed
//!   stack, drawing an id from the shared ray counter for every ray.
//!
//! Pixel colors depend only on the scene and the pixel, never on which
//! worker rendered them, so the output is identical for any worker count.

pub mod env;
pub mod framebuffer;
pub mod raystack;
pub mod workpool;

use std::f32::consts::TAU;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use prt_arena::ArenaRegion;
use prt_core::{SceneError, WorkerId};
use prt_engine::{
    GeometrySummary, RunError, SceneDescriptor, SceneSetup, SharedState, WorkerBackend,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

pub use env::EnvSettings;
pub use framebuffer::Framebuffer;
pub use raystack::{RayEntry, RayTreeStack};
pub use workpool::Job;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a digest.
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Count primitives in a geometry listing.
///
/// Blank lines and `#` comments are skipped. A line starting in column 0
/// opens a new object; every content line, indented or not, is one element.
pub fn count_primitives(text: &str) -> GeometrySummary {
    let mut summary = GeometrySummary::default();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        summary.elements += 1;
        if !line.starts_with(char::is_whitespace) {
            summary.objects += 1;
        }
    }
    summary
}

/// Base color of a ray at `depth` through normalized image point `(u, v)`.
fn shade(seed: u64, u: f32, v: f32, depth: u32) -> [f32; 3] {
    let phase = (seed % 360) as f32 * (TAU / 360.0);
    let d = depth as f32;
    [
        0.5 + 0.5 * (TAU * u + phase + d).sin(),
        0.5 + 0.5 * (TAU * v - phase + 0.5 * d).cos(),
        0.5 + 0.5 * (TAU * 0.5 * (u + v) + 0.25 * d).sin(),
    ]
}

/// Scene state and collaborator hooks of the flat-shade renderer.
#[derive(Debug, Default)]
pub struct FlatShade {
    env_path: PathBuf,
    settings: EnvSettings,
    geometry: Option<(ArenaRegion, usize)>,
    seed: u64,
    framebuffer: Option<Framebuffer>,
}

impl FlatShade {
    /// An empty backend; [`SceneSetup::load_scene`] fills it in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings from the loaded environment file.
    pub fn settings(&self) -> &EnvSettings {
        &self.settings
    }

    /// Shading seed computed by `build_acceleration_structure`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn trace_pixel(
        &self,
        x: u32,
        y: u32,
        shared: &SharedState,
        stack: &mut RayTreeStack,
    ) -> [u8; 3] {
        let (width, height) = self.settings.resolution;
        let samples = shared.samples_per_pixel();
        let pixel = u64::from(y) * u64::from(width) + u64::from(x);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ pixel);

        let mut color = [0.0f32; 3];
        for _ in 0..samples {
            let (jx, jy) = if samples > 1 {
                (rng.random::<f32>(), rng.random::<f32>())
            } else {
                (0.5, 0.5)
            };
            let u = (x as f32 + jx) / width as f32;
            let v = (y as f32 + jy) / height as f32;
            let sample = self.trace_sample(u, v, shared, stack);
            for (acc, s) in color.iter_mut().zip(sample) {
                *acc += s;
            }
        }
        color.map(|c| ((c / samples as f32).clamp(0.0, 1.0) * 255.0).round() as u8)
    }

    /// Walk the ray tree of one sample depth first.
    fn trace_sample(&self, u: f32, v: f32, shared: &SharedState, stack: &mut RayTreeStack) -> [f32; 3] {
        let max_level = self.settings.max_level;
        stack.clear();
        let root = RayEntry {
            ray: shared.next_ray_id(),
            depth: 0,
            weight: 1.0,
        };
        if stack.push(root).is_err() {
            return [0.0; 3];
        }

        let mut color = [0.0f32; 3];
        while let Some(entry) = stack.pop() {
            let base = shade(self.seed, u, v, entry.depth);
            for (acc, b) in color.iter_mut().zip(base) {
                *acc += entry.weight * b;
            }
            if entry.depth == max_level {
                continue;
            }
            for _ in 0..2 {
                let child = RayEntry {
                    ray: shared.next_ray_id(),
                    depth: entry.depth + 1,
                    weight: entry.weight * 0.5,
                };
                if stack.push(child).is_err() {
                    warn!(depth = child.depth, "ray-tree stack full, pruning");
                    break;
                }
            }
        }
        // Each level carries a total weight of 1.
        let levels = (max_level + 1) as f32;
        color.map(|c| c / levels)
    }
}

impl SceneSetup for FlatShade {
    fn load_scene(
        &mut self,
        path: &Path,
        _shared: &SharedState,
    ) -> Result<SceneDescriptor, RunError> {
        self.settings = EnvSettings::load(path)?;
        self.env_path = path.to_path_buf();
        debug!(
            width = self.settings.resolution.0,
            height = self.settings.resolution.1,
            max_level = self.settings.max_level,
            "environment loaded"
        );
        Ok(SceneDescriptor {
            geometry: self.settings.geometry.clone(),
            output: self.settings.output.clone(),
        })
    }

    fn load_geometry(
        &mut self,
        path: &Path,
        shared: &SharedState,
    ) -> Result<GeometrySummary, RunError> {
        let bytes = fs::read(path).map_err(|e| SceneError::open(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        let summary = count_primitives(&text);

        let mut region = shared.arena().allocate(bytes.len())?;
        region.as_bytes_mut()[..bytes.len()].copy_from_slice(&bytes);
        self.geometry = Some((region, bytes.len()));
        Ok(summary)
    }

    fn build_acceleration_structure(&mut self, _shared: &SharedState) -> Result<(), RunError> {
        let (region, len) = self.geometry.as_ref().ok_or_else(|| SceneError::Missing {
            path: self.env_path.clone(),
            setting: "geometry",
        })?;
        self.seed = fnv1a(&region.as_bytes()[..*len]);
        debug!(seed = self.seed, bytes = len, "geometry digested");
        Ok(())
    }

    fn open_output(&mut self, shared: &SharedState) -> Result<(), RunError> {
        let (width, height) = self.settings.resolution;
        self.framebuffer = Some(Framebuffer::allocate(width, height, shared.arena())?);
        Ok(())
    }

    fn close_output(&mut self, path: &Path) -> Result<(), RunError> {
        let framebuffer = self.framebuffer.take().ok_or(SceneError::OutputNotOpen)?;
        let write_err = |source| SceneError::Write {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        framebuffer.write_to(&mut out).map_err(write_err)?;
        out.flush().map_err(write_err)?;
        info!(path = %path.display(), "image written");
        Ok(())
    }
}

impl WorkerBackend for FlatShade {
    type RayStack = RayTreeStack;

    fn max_ray_depth(&self) -> u32 {
        self.settings.max_level
    }

    fn init_work_pool(&self, worker: WorkerId, shared: &SharedState) -> Result<(), RunError> {
        workpool::init_pool(worker, shared, self.settings.resolution, self.settings.bundle)?;
        Ok(())
    }

    fn init_ray_stack(
        &self,
        max_depth: u32,
        _worker: WorkerId,
        shared: &SharedState,
    ) -> Result<RayTreeStack, RunError> {
        Ok(RayTreeStack::with_depth(max_depth, shared.arena())?)
    }

    fn render(&self, worker: WorkerId, shared: &SharedState, stack: &mut RayTreeStack) {
        let Some(framebuffer) = self.framebuffer.as_ref() else {
            warn!(worker = worker.0, "no framebuffer, nothing to render");
            return;
        };
        let mut jobs = 0usize;
        while let Some(job) = workpool::next_job(shared, worker) {
            for (x, y) in job.pixels() {
                let rgb = self.trace_pixel(x, y, shared, stack);
                framebuffer.put_pixel(x, y, rgb);
            }
            jobs += 1;
        }
        debug!(worker = worker.0, jobs, "render finished");
    }
}
