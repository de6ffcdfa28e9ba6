//! Worker bootstrap sequence.
//!
//! Every worker, including the one on the calling thread, runs
//! [`run_worker`] exactly once:
//!
//! 1. acquire an id under the id lock;
//! 2. start a timer if this is worker 0 or per-worker stats are on;
//! 3. build the private work pool and ray-tree stack;
//! 4. wait at the start barrier;
//! 5. render;
//! 6. record the elapsed time, and for worker 0 the release instant.
//!
//! A started timer covers steps 3 to 5, so worker 0's figure includes the
//! time it spent waiting for stragglers at the barrier.

use std::time::Instant;

use prt_core::WorkerId;
use tracing::{debug, debug_span, trace};

use crate::backend::WorkerBackend;
use crate::barrier::StartBarrier;
use crate::error::RunError;
use crate::shared::SharedState;

/// Aborts the start barrier if the worker leaves before arriving, whether
/// by error return or by unwinding.
struct ArrivalGuard<'a> {
    barrier: &'a StartBarrier,
    armed: bool,
}

impl<'a> ArrivalGuard<'a> {
    fn new(barrier: &'a StartBarrier) -> Self {
        Self {
            barrier,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ArrivalGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.barrier.abort();
        }
    }
}

/// Run one worker from id acquisition to the end of rendering.
pub fn run_worker<B: WorkerBackend>(shared: &SharedState, backend: &B) -> Result<WorkerId, RunError> {
    let mut guard = ArrivalGuard::new(shared.start_barrier());

    let worker = shared.acquire_worker_id()?;
    let timer = (worker.is_primary() || shared.per_worker_stats()).then(Instant::now);
    let _span = debug_span!("worker", id = worker.0).entered();

    backend.init_work_pool(worker, shared)?;
    let mut stack = backend.init_ray_stack(backend.max_ray_depth(), worker, shared)?;
    trace!("private initialization complete");

    guard.disarm();
    let wait = shared
        .start_barrier()
        .arrive_and_wait()
        .map_err(|_| RunError::StartAborted)?;
    let released_at = Instant::now();
    trace!(leader = wait.is_leader(), "start barrier released");

    backend.render(worker, shared, &mut stack);

    if let Some(begin) = timer {
        let elapsed = begin.elapsed();
        shared.record_elapsed(worker, elapsed)?;
        if worker.is_primary() {
            shared.mark_parallel_start(released_at);
        }
        debug!(elapsed_ms = elapsed.as_secs_f64() * 1e3, "worker finished");
    }
    Ok(worker)
}
