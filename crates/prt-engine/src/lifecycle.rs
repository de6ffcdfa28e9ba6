//! Worker lifecycle manager.
//!
//! [`launch`] spawns `worker_count - 1` named scoped threads, runs the
//! same bootstrap sequence on the calling thread, and joins every spawned
//! thread before returning, on success and error paths alike.
//!
//! A spawn failure aborts the start barrier so that the workers already
//! running unwind instead of waiting for a peer that will never arrive.
//! The run never continues with fewer workers than configured.
//!
//! A panic in any worker, spawned or inline, is reported as
//! [`RunError::WorkerPanicked`] naming the thread it happened on.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};

use prt_core::WorkerId;
use tracing::{debug, error, warn};

use crate::backend::WorkerBackend;
use crate::bootstrap::run_worker;
use crate::error::RunError;
use crate::shared::SharedState;

/// Prefix of every spawned worker's thread name.
pub const WORKER_THREAD_PREFIX: &str = "prt-worker";

/// Owns the handles of the spawned workers of one run.
struct WorkerPool<'scope> {
    handles: Vec<(String, ScopedJoinHandle<'scope, Result<WorkerId, RunError>>)>,
}

impl<'scope> WorkerPool<'scope> {
    fn with_capacity(n: usize) -> Self {
        Self {
            handles: Vec::with_capacity(n),
        }
    }

    fn spawn<'env, B: WorkerBackend>(
        &mut self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        shared: &'env SharedState,
        backend: &'env B,
    ) -> io::Result<()> {
        let name = format!("{WORKER_THREAD_PREFIX}-{index}");
        #[cfg(test)]
        if tests::FAIL_SPAWN_AT.with(|at| at.get()) == Some(index) {
            return Err(io::Error::other("thread creation refused"));
        }
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn_scoped(scope, move || run_worker(shared, backend))?;
        self.handles.push((name, handle));
        Ok(())
    }

    /// Join every handle, turning panics into errors.
    fn join_all(self) -> Vec<Result<WorkerId, RunError>> {
        self.handles
            .into_iter()
            .map(|(name, handle)| match handle.join() {
                Ok(outcome) => outcome,
                Err(_) => {
                    error!(thread = %name, "worker panicked");
                    Err(RunError::WorkerPanicked { name })
                }
            })
            .collect()
    }
}

/// Run every worker of `shared` to completion.
///
/// Returns the ids of all workers, sorted, or the first root-cause error.
pub fn launch<B: WorkerBackend>(shared: &SharedState, backend: &B) -> Result<Vec<WorkerId>, RunError> {
    let n = shared.worker_count();
    debug!(workers = n, "launching workers");

    thread::scope(|scope| {
        let mut pool = WorkerPool::with_capacity(n - 1);
        let mut spawn_failure = None;
        for index in 1..n {
            if let Err(source) = pool.spawn(scope, index, shared, backend) {
                error!(index, %source, "cannot create worker");
                shared.start_barrier().abort();
                spawn_failure = Some(RunError::Spawn { index, source });
                break;
            }
        }

        let inline = match spawn_failure {
            None => Some(run_inline(shared, backend)),
            Some(_) => None,
        };
        let mut outcomes = pool.join_all();
        if let Some(err) = spawn_failure {
            return Err(err);
        }
        outcomes.extend(inline);
        collect(outcomes)
    })
}

/// Run one worker on the calling thread, turning a panic into an error.
fn run_inline<B: WorkerBackend>(shared: &SharedState, backend: &B) -> Result<WorkerId, RunError> {
    panic::catch_unwind(AssertUnwindSafe(|| run_worker(shared, backend))).unwrap_or_else(|_| {
        let name = thread::current().name().unwrap_or("main").to_string();
        error!(thread = %name, "worker panicked");
        Err(RunError::WorkerPanicked { name })
    })
}

/// Fold worker outcomes into the sorted id list or one error.
///
/// A root cause is preferred over the `StartAborted` it caused elsewhere.
fn collect(outcomes: Vec<Result<WorkerId, RunError>>) -> Result<Vec<WorkerId>, RunError> {
    let mut ids = Vec::with_capacity(outcomes.len());
    let mut errors = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(id) => ids.push(id),
            Err(e) => errors.push(e),
        }
    }
    if errors.is_empty() {
        ids.sort_unstable();
        return Ok(ids);
    }
    if errors.len() > 1 {
        warn!(failed = errors.len(), "several workers failed");
    }
    let root = errors.iter().position(|e| !e.is_secondary()).unwrap_or(0);
    Err(errors.swap_remove(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use prt_arena::{ArenaConfig, GlobalArena};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    thread_local! {
        /// Index whose thread creation fails on this test's thread.
        pub(super) static FAIL_SPAWN_AT: Cell<Option<usize>> = const { Cell::new(None) };
    }

    struct Counting {
        inits: AtomicUsize,
        renders: AtomicUsize,
        panic_in_init: Option<u32>,
        panic_off_pool: bool,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                inits: AtomicUsize::new(0),
                renders: AtomicUsize::new(0),
                panic_in_init: None,
                panic_off_pool: false,
            }
        }
    }

    fn on_pool_thread() -> bool {
        thread::current()
            .name()
            .is_some_and(|name| name.starts_with(WORKER_THREAD_PREFIX))
    }

    impl WorkerBackend for Counting {
        type RayStack = ();

        fn max_ray_depth(&self) -> u32 {
            1
        }

        fn init_work_pool(&self, worker: WorkerId, _shared: &SharedState) -> Result<(), RunError> {
            if self.panic_in_init == Some(worker.0) || (self.panic_off_pool && !on_pool_thread()) {
                panic!("init failed for worker {worker}");
            }
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn init_ray_stack(&self, _: u32, _: WorkerId, _: &SharedState) -> Result<(), RunError> {
            Ok(())
        }

        fn render(&self, _worker: WorkerId, shared: &SharedState, _stack: &mut ()) {
            assert_eq!(self.inits.load(Ordering::SeqCst), shared.worker_count());
            self.renders.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn shared(workers: usize) -> SharedState {
        let arena = GlobalArena::init(ArenaConfig::new(1024)).unwrap();
        SharedState::new(&RunConfig::with_workers(workers), arena).unwrap()
    }

    #[test]
    fn every_worker_runs_once() {
        for n in [1, 2, 7] {
            let shared = shared(n);
            let backend = Counting::new();
            let ids = launch(&shared, &backend).unwrap();
            assert_eq!(ids, (0..n as u32).map(WorkerId).collect::<Vec<_>>());
            assert_eq!(backend.renders.load(Ordering::SeqCst), n);
            assert_eq!(shared.start_barrier().releases(), 1);
        }
    }

    #[test]
    fn panic_before_barrier_unwinds_everyone() {
        let shared = shared(3);
        let mut backend = Counting::new();
        // Id 2 may land on a spawned thread or on the inline worker.
        backend.panic_in_init = Some(2);
        let result = panic::catch_unwind(AssertUnwindSafe(|| launch(&shared, &backend)));
        assert!(
            matches!(result, Ok(Err(RunError::WorkerPanicked { .. }))),
            "unexpected outcome {result:?}"
        );
        assert_eq!(backend.renders.load(Ordering::SeqCst), 0);
        assert!(shared.start_barrier().is_aborted());
    }

    #[test]
    fn inline_worker_panic_becomes_error() {
        let shared = shared(2);
        let mut backend = Counting::new();
        backend.panic_off_pool = true;
        let result = panic::catch_unwind(AssertUnwindSafe(|| launch(&shared, &backend)));
        match result {
            Ok(Err(RunError::WorkerPanicked { name })) => {
                assert!(!name.starts_with(WORKER_THREAD_PREFIX), "{name}");
            }
            other => panic!("panic escaped or was misreported: {other:?}"),
        }
        assert_eq!(backend.renders.load(Ordering::SeqCst), 0);
        assert!(shared.start_barrier().is_aborted());
    }

    #[test]
    fn spawn_failure_aborts_and_joins_started_workers() {
        let shared = shared(4);
        let backend = Counting::new();
        FAIL_SPAWN_AT.with(|at| at.set(Some(2)));
        let result = launch(&shared, &backend);
        FAIL_SPAWN_AT.with(|at| at.set(None));

        match result {
            Err(RunError::Spawn { index, .. }) => assert_eq!(index, 2),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(shared.start_barrier().is_aborted());
        assert_eq!(shared.start_barrier().releases(), 0);
        assert_eq!(backend.renders.load(Ordering::SeqCst), 0);
        // Only the worker spawned before the failure ran, and the inline
        // worker never started.
        assert_eq!(shared.workers_started(), 1);
    }

    #[test]
    fn collect_prefers_root_cause() {
        let outcomes = vec![
            Ok(WorkerId(1)),
            Err(RunError::StartAborted),
            Err(RunError::WorkerPanicked {
                name: "prt-worker-2".into(),
            }),
            Err(RunError::StartAborted),
        ];
        assert!(matches!(
            collect(outcomes),
            Err(RunError::WorkerPanicked { .. })
        ));
        assert!(matches!(
            collect(vec![Err(RunError::StartAborted)]),
            Err(RunError::StartAborted)
        ));
    }

    #[test]
    fn collect_sorts_ids() {
        let outcomes = vec![Ok(WorkerId(2)), Ok(WorkerId(0)), Ok(WorkerId(1))];
        assert_eq!(
            collect(outcomes).unwrap(),
            vec![WorkerId(0), WorkerId(1), WorkerId(2)]
        );
    }
}
