//! Per-worker work pools.
//!
//! The image is cut into bundles of `bundle.0 × bundle.1` pixels, dealt
//! round-robin: bundle `b` goes to worker `b % worker_count`. Each worker
//! lays its own bundles out in an arena region stored in its pool slot:
//!
//! ```text
//! word 0       head (next job from the front)
//! word 1       tail (one past the last job)
//! word 2 + 4j  job j: x, y, w, h
//! ```
//!
//! The owner takes jobs from the front. Once its pool is empty it steals
//! from the back of the other pools, each under that pool's slot lock.

use prt_arena::ArenaRegion;
use prt_core::WorkerId;
use prt_engine::{RunError, SharedState};
use tracing::trace;

const HEADER_WORDS: usize = 2;
const JOB_WORDS: usize = 4;

/// A rectangle of pixels rendered as one unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Job {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels.
    pub w: u32,
    /// Height in pixels.
    pub h: u32,
}

impl Job {
    /// Pixel coordinates covered by this job, row by row.
    pub fn pixels(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y..self.y + self.h).flat_map(move |y| (self.x..self.x + self.w).map(move |x| (x, y)))
    }
}

/// Every bundle of the image in row-major order, clipped at the edges.
pub fn bundles(resolution: (u32, u32), bundle: (u32, u32)) -> impl Iterator<Item = Job> {
    let (width, height) = resolution;
    let (bw, bh) = bundle;
    (0..height).step_by(bh as usize).flat_map(move |y| {
        (0..width).step_by(bw as usize).map(move |x| Job {
            x,
            y,
            w: bw.min(width - x),
            h: bh.min(height - y),
        })
    })
}

/// Bytes needed for a pool holding `jobs` jobs.
pub fn pool_bytes(jobs: usize) -> usize {
    (HEADER_WORDS + JOB_WORDS * jobs) * 4
}

/// Build `worker`'s pool from its share of the bundles and store it in
/// the worker's slot.
pub fn init_pool(
    worker: WorkerId,
    shared: &SharedState,
    resolution: (u32, u32),
    bundle: (u32, u32),
) -> Result<usize, RunError> {
    let n = shared.worker_count();
    let mine: Vec<Job> = bundles(resolution, bundle)
        .enumerate()
        .filter(|(b, _)| b % n == worker.index())
        .map(|(_, job)| job)
        .collect();

    let mut region = shared.arena().allocate(pool_bytes(mine.len()))?;
    fill(&mut region, &mine);
    *shared.lock_pool(worker) = Some(region);
    trace!(worker = worker.0, jobs = mine.len(), "work pool ready");
    Ok(mine.len())
}

/// Write `jobs` into an empty pool region.
pub fn fill(region: &mut ArenaRegion, jobs: &[Job]) {
    region.write_u32(0, 0);
    region.write_u32(1, jobs.len() as u32);
    for (j, job) in jobs.iter().enumerate() {
        let base = HEADER_WORDS + JOB_WORDS * j;
        region.write_u32(base, job.x);
        region.write_u32(base + 1, job.y);
        region.write_u32(base + 2, job.w);
        region.write_u32(base + 3, job.h);
    }
}

fn read_job(region: &ArenaRegion, j: u32) -> Job {
    let base = HEADER_WORDS + JOB_WORDS * j as usize;
    Job {
        x: region.read_u32(base),
        y: region.read_u32(base + 1),
        w: region.read_u32(base + 2),
        h: region.read_u32(base + 3),
    }
}

/// Take the next job from the front of a pool.
pub fn take_front(region: &mut ArenaRegion) -> Option<Job> {
    let (head, tail) = (region.read_u32(0), region.read_u32(1));
    if head >= tail {
        return None;
    }
    region.write_u32(0, head + 1);
    Some(read_job(region, head))
}

/// Take the last job from the back of a pool.
pub fn take_back(region: &mut ArenaRegion) -> Option<Job> {
    let (head, tail) = (region.read_u32(0), region.read_u32(1));
    if head >= tail {
        return None;
    }
    region.write_u32(1, tail - 1);
    Some(read_job(region, tail - 1))
}

/// Jobs left in a pool.
pub fn remaining(region: &ArenaRegion) -> usize {
    region.read_u32(1).saturating_sub(region.read_u32(0)) as usize
}

/// Next job for `worker`: its own pool first, then the others in order.
pub fn next_job(shared: &SharedState, worker: WorkerId) -> Option<Job> {
    if let Some(job) = shared.lock_pool(worker).as_mut().and_then(take_front) {
        return Some(job);
    }
    let n = shared.worker_count() as u32;
    (1..n)
        .map(|k| WorkerId((worker.0 + k) % n))
        .find_map(|victim| {
            let job = shared.lock_pool(victim).as_mut().and_then(take_back);
            if job.is_some() {
                trace!(worker = worker.0, victim = victim.0, "stole job");
            }
            job
        })
}
