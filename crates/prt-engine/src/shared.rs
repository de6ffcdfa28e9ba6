//! Shared coordination state.
//!
//! One [`SharedState`] is built by the main thread before any worker
//! exists and handed to every worker by reference. Each logical field has
//! its own lock so unrelated counters never contend:
//!
//! ```text
//! SharedState
//! ├── arena            GlobalArena (own lock, serializes allocation)
//! ├── next_worker_id   Mutex<u32>  (id lock)
//! ├── next_ray_id      Mutex<u64>  (ray lock)
//! ├── start            StartBarrier (target = worker_count)
//! ├── pool_slots[N]    Mutex<Option<ArenaRegion>> (one per worker)
//! ├── timings[N]       OnceLock<Duration> (written once by its owner)
//! └── parallel_start   OnceLock<Instant> (worker 0's release instant)
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

use prt_arena::{ArenaRegion, GlobalArena};
use prt_core::{RayId, WorkerId};
use smallvec::SmallVec;
use tracing::trace;

use crate::barrier::StartBarrier;
use crate::config::{ConfigError, RunConfig, MAX_WORKERS};
use crate::error::RunError;

/// Per-worker timing snapshot, inline for typical worker counts.
pub type TimingTable = SmallVec<[Option<Duration>; 16]>;

/// Process-wide state shared by every worker of one run.
pub struct SharedState {
    worker_count: usize,
    per_worker_stats: bool,
    samples_per_pixel: u32,
    arena: GlobalArena,
    next_worker_id: Mutex<u32>,
    next_ray_id: Mutex<u64>,
    start: StartBarrier,
    pool_slots: Box<[Mutex<Option<ArenaRegion>>]>,
    timings: Box<[OnceLock<Duration>]>,
    parallel_start: OnceLock<Instant>,
}

// Compile-time assertion: workers borrow SharedState across threads.
const _: fn() = || {
    fn assert_sync<T: Sync>() {}
    assert_sync::<SharedState>();
};

impl SharedState {
    /// Build the state for `config.workers` workers over `arena`.
    pub fn new(config: &RunConfig, arena: GlobalArena) -> Result<Self, ConfigError> {
        let n = config.workers;
        if n == 0 || n > MAX_WORKERS {
            return Err(ConfigError::WorkerCountOutOfRange {
                requested: n,
                max: MAX_WORKERS,
            });
        }
        Ok(Self {
            worker_count: n,
            per_worker_stats: config.per_worker_stats,
            samples_per_pixel: config.samples_per_pixel,
            arena,
            next_worker_id: Mutex::new(0),
            next_ray_id: Mutex::new(RayId::FIRST.0),
            start: StartBarrier::new(n),
            pool_slots: (0..n).map(|_| Mutex::new(None)).collect(),
            timings: (0..n).map(|_| OnceLock::new()).collect(),
            parallel_start: OnceLock::new(),
        })
    }

    /// Configured number of workers.
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Whether every worker times itself.
    pub fn per_worker_stats(&self) -> bool {
        self.per_worker_stats
    }

    /// Samples traced per pixel.
    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    /// The global arena.
    pub fn arena(&self) -> &GlobalArena {
        &self.arena
    }

    /// The start barrier, sized to `worker_count`.
    pub fn start_barrier(&self) -> &StartBarrier {
        &self.start
    }

    // ── Counters ────────────────────────────────────────────────

    /// Hand out the next worker id under the id lock.
    ///
    /// Fails once `worker_count` ids have been issued.
    pub fn acquire_worker_id(&self) -> Result<WorkerId, RunError> {
        let mut next = self.next_worker_id.lock().unwrap();
        if *next as usize >= self.worker_count {
            return Err(RunError::WorkerIdsExhausted {
                worker_count: self.worker_count,
            });
        }
        let id = WorkerId(*next);
        *next += 1;
        trace!(worker = id.0, "worker id acquired");
        Ok(id)
    }

    /// Number of worker ids issued so far.
    pub fn workers_started(&self) -> usize {
        *self.next_worker_id.lock().unwrap() as usize
    }

    /// Hand out the next ray id under the ray lock. Ids start at 1.
    pub fn next_ray_id(&self) -> RayId {
        let mut next = self.next_ray_id.lock().unwrap();
        let id = RayId(*next);
        *next += 1;
        id
    }

    /// Number of ray ids issued so far.
    pub fn rays_issued(&self) -> u64 {
        *self.next_ray_id.lock().unwrap() - RayId::FIRST.0
    }

    // ── Work-pool slots ─────────────────────────────────────────

    /// Lock the work-pool slot owned by `worker`.
    ///
    /// # Panics
    ///
    /// Panics if `worker` is not below `worker_count`.
    pub fn lock_pool(&self, worker: WorkerId) -> MutexGuard<'_, Option<ArenaRegion>> {
        self.pool_slots[worker.index()].lock().unwrap()
    }

    // ── Timing ──────────────────────────────────────────────────

    /// Write `worker`'s elapsed time. Each slot accepts one write.
    pub fn record_elapsed(&self, worker: WorkerId, elapsed: Duration) -> Result<(), RunError> {
        self.timings
            .get(worker.index())
            .ok_or(RunError::WorkerIdsExhausted {
                worker_count: self.worker_count,
            })?
            .set(elapsed)
            .map_err(|_| RunError::TimingSlotRewritten { worker })
    }

    /// `worker`'s recorded elapsed time, if any.
    pub fn elapsed(&self, worker: WorkerId) -> Option<Duration> {
        self.timings.get(worker.index()).and_then(|t| t.get().copied())
    }

    /// Snapshot of every timing slot, indexed by worker id.
    pub fn timing_table(&self) -> TimingTable {
        self.timings.iter().map(|t| t.get().copied()).collect()
    }

    /// Publish the instant the start barrier released. First write wins.
    pub fn mark_parallel_start(&self, at: Instant) {
        let _ = self.parallel_start.set(at);
    }

    /// The published barrier-release instant.
    pub fn parallel_start(&self) -> Option<Instant> {
        self.parallel_start.get().copied()
    }
}

impl std::fmt::Debug for SharedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedState")
            .field("worker_count", &self.worker_count)
            .field("per_worker_stats", &self.per_worker_stats)
            .field("workers_started", &self.workers_started())
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}
