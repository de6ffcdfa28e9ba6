//! Test utilities for prt development.
//!
//! [`RecordingBackend`] implements both collaborator traits without doing
//! any rendering. It allocates configurable amounts of arena memory in
//! each hook and streams an [`Event`] for every call over a
//! crossbeam channel, so tests can assert on the exact sequence the
//! execution core drove.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use prt_arena::ArenaRegion;
use prt_core::{SceneError, WorkerId};
use prt_engine::{GeometrySummary, RunError, SceneDescriptor, SceneSetup, SharedState, WorkerBackend};

/// One collaborator call observed by a [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    SceneLoaded(PathBuf),
    GeometryLoaded(PathBuf),
    OutputOpened,
    AccelerationBuilt,
    WorkPoolReady(WorkerId),
    RayStackReady { worker: WorkerId, max_depth: u32 },
    /// `initialized` is the number of workers whose private init had
    /// finished when this render began.
    RenderStarted { worker: WorkerId, initialized: usize },
    RenderFinished(WorkerId),
    OutputClosed(PathBuf),
}

/// Knobs for [`RecordingBackend`].
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// Shared bytes allocated by `load_geometry`.
    pub scene_bytes: usize,
    /// Bytes allocated by each `init_work_pool`.
    pub pool_bytes: usize,
    /// Bytes per level allocated by each `init_ray_stack`.
    pub stack_bytes_per_level: usize,
    /// Depth passed to `init_ray_stack`.
    pub max_depth: u32,
    /// Sleep inside `init_ray_stack`, to widen the window in which a
    /// worker could start rendering too early.
    pub init_delay: Duration,
    /// Sleep inside `render`.
    pub render_delay: Duration,
    /// Ray ids drawn from the shared counter by each render.
    pub rays_per_render: u64,
    /// Make `load_scene` fail as if the file did not exist.
    pub missing_scene: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            scene_bytes: 4096,
            pool_bytes: 256,
            stack_bytes_per_level: 16,
            max_depth: 5,
            init_delay: Duration::ZERO,
            render_delay: Duration::ZERO,
            rays_per_render: 4,
            missing_scene: false,
        }
    }
}

impl RecorderConfig {
    /// Arena bytes one worker's private init allocates.
    pub fn private_bytes(&self) -> usize {
        self.pool_bytes + self.stack_bytes_per_level * (self.max_depth as usize + 1)
    }
}

/// Collaborator that records every call instead of rendering.
pub struct RecordingBackend {
    config: RecorderConfig,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    initialized: AtomicUsize,
    scene: Option<ArenaRegion>,
}

impl RecordingBackend {
    pub fn new(config: RecorderConfig) -> Self {
        let (tx, rx) = unbounded();
        Self {
            config,
            tx,
            rx,
            initialized: AtomicUsize::new(0),
            scene: None,
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Drain every event recorded so far, in arrival order.
    pub fn events(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    fn record(&self, event: Event) {
        // The receiver lives as long as self.
        let _ = self.tx.send(event);
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new(RecorderConfig::default())
    }
}

impl SceneSetup for RecordingBackend {
    fn load_scene(
        &mut self,
        path: &Path,
        _shared: &SharedState,
    ) -> Result<SceneDescriptor, RunError> {
        if self.config.missing_scene {
            return Err(SceneError::open(path, io::Error::from(io::ErrorKind::NotFound)).into());
        }
        self.record(Event::SceneLoaded(path.to_path_buf()));
        Ok(SceneDescriptor {
            geometry: path.with_extension("geo"),
            output: path.with_extension("rgb"),
        })
    }

    fn load_geometry(
        &mut self,
        path: &Path,
        shared: &SharedState,
    ) -> Result<GeometrySummary, RunError> {
        self.scene = Some(shared.arena().allocate(self.config.scene_bytes)?);
        self.record(Event::GeometryLoaded(path.to_path_buf()));
        Ok(GeometrySummary {
            objects: 1,
            elements: self.config.scene_bytes / 16,
        })
    }

    fn build_acceleration_structure(&mut self, _shared: &SharedState) -> Result<(), RunError> {
        self.record(Event::AccelerationBuilt);
        Ok(())
    }

    fn open_output(&mut self, _shared: &SharedState) -> Result<(), RunError> {
        self.record(Event::OutputOpened);
        Ok(())
    }

    fn close_output(&mut self, path: &Path) -> Result<(), RunError> {
        self.record(Event::OutputClosed(path.to_path_buf()));
        Ok(())
    }
}

impl WorkerBackend for RecordingBackend {
    type RayStack = ArenaRegion;

    fn max_ray_depth(&self) -> u32 {
        self.config.max_depth
    }

    fn init_work_pool(&self, worker: WorkerId, shared: &SharedState) -> Result<(), RunError> {
        let region = shared.arena().allocate(self.config.pool_bytes)?;
        *shared.lock_pool(worker) = Some(region);
        self.record(Event::WorkPoolReady(worker));
        Ok(())
    }

    fn init_ray_stack(
        &self,
        max_depth: u32,
        worker: WorkerId,
        shared: &SharedState,
    ) -> Result<ArenaRegion, RunError> {
        thread::sleep(self.config.init_delay);
        let bytes = self.config.stack_bytes_per_level * (max_depth as usize + 1);
        let stack = shared.arena().allocate(bytes)?;
        self.initialized.fetch_add(1, Ordering::SeqCst);
        self.record(Event::RayStackReady { worker, max_depth });
        Ok(stack)
    }

    fn render(&self, worker: WorkerId, shared: &SharedState, stack: &mut ArenaRegion) {
        self.record(Event::RenderStarted {
            worker,
            initialized: self.initialized.load(Ordering::SeqCst),
        });
        for _ in 0..self.config.rays_per_render {
            let ray = shared.next_ray_id();
            if stack.len() >= 8 {
                stack.write_u64(0, ray.0);
            }
        }
        thread::sleep(self.config.render_delay);
        self.record(Event::RenderFinished(worker));
    }
}

/// Events of `kind` in `events`.
pub fn count<F: Fn(&Event) -> bool>(events: &[Event], kind: F) -> usize {
    events.iter().filter(|e| kind(e)).count()
}
