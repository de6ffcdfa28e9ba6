//! Reusable start barrier.
//!
//! [`StartBarrier`] is the one phase-wide rendezvous of a run: every worker
//! finishes its private initialization, arrives, and blocks until the last
//! arrival releases them all together.
//!
//! The arrival count is reset on release and the generation advanced, so
//! the same barrier can be crossed again. Waiters compare generations
//! rather than counts, which keeps spurious wakeups harmless.
//!
//! A worker that can never arrive (its thread failed to spawn, its
//! initialization failed, it panicked) would otherwise leave the rest
//! blocked forever. [`abort()`](StartBarrier::abort) poisons the barrier
//! instead: current and future waiters return [`BarrierAborted`].

use std::sync::{Condvar, Mutex};

use thiserror::Error;

struct BarrierState {
    arrived: usize,
    generation: u64,
    aborted: bool,
}

/// Mutex + condition variable + arrival counter.
pub struct StartBarrier {
    target: usize,
    state: Mutex<BarrierState>,
    released: Condvar,
}

/// Result of a successful [`StartBarrier::arrive_and_wait`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierWait {
    generation: u64,
    leader: bool,
}

impl BarrierWait {
    /// Which rendezvous this arrival took part in, counting from 0.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this was the arrival that released the others.
    pub fn is_leader(&self) -> bool {
        self.leader
    }
}

/// The barrier was aborted before it released this arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("start barrier aborted")]
pub struct BarrierAborted;

impl StartBarrier {
    /// A barrier releasing every `target` arrivals.
    ///
    /// # Panics
    ///
    /// Panics if `target` is zero.
    pub fn new(target: usize) -> Self {
        assert!(target > 0, "barrier target must be at least 1");
        Self {
            target,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                aborted: false,
            }),
            released: Condvar::new(),
        }
    }

    /// Number of arrivals needed for a release.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Arrive and block until `target` arrivals have been counted.
    ///
    /// With a target of 1 every call returns immediately as leader.
    pub fn arrive_and_wait(&self) -> Result<BarrierWait, BarrierAborted> {
        let mut state = self.state.lock().unwrap();
        if state.aborted {
            return Err(BarrierAborted);
        }

        let generation = state.generation;
        state.arrived += 1;
        if state.arrived == self.target {
            state.arrived = 0;
            state.generation += 1;
            self.released.notify_all();
            return Ok(BarrierWait {
                generation,
                leader: true,
            });
        }

        let state = self
            .released
            .wait_while(state, |s| s.generation == generation && !s.aborted)
            .unwrap();
        if state.generation == generation {
            return Err(BarrierAborted);
        }
        Ok(BarrierWait {
            generation,
            leader: false,
        })
    }

    /// Poison the barrier and wake every waiter.
    ///
    /// Arrivals already released keep their result.
    pub fn abort(&self) {
        let mut state = self.state.lock().unwrap();
        state.aborted = true;
        self.released.notify_all();
    }

    /// Whether [`abort()`](Self::abort) has been called.
    pub fn is_aborted(&self) -> bool {
        self.state.lock().unwrap().aborted
    }

    /// Number of completed rendezvous.
    pub fn releases(&self) -> u64 {
        self.state.lock().unwrap().generation
    }

    /// Arrivals counted towards the next release.
    pub fn waiting(&self) -> usize {
        self.state.lock().unwrap().arrived
    }
}

impl std::fmt::Debug for StartBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("StartBarrier")
            .field("target", &self.target)
            .field("arrived", &state.arrived)
            .field("generation", &state.generation)
            .field("aborted", &state.aborted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_target_releases_immediately() {
        let barrier = StartBarrier::new(1);
        let wait = barrier.arrive_and_wait().unwrap();
        assert!(wait.is_leader());
        assert_eq!(wait.generation(), 0);
        assert_eq!(barrier.releases(), 1);
        assert_eq!(barrier.waiting(), 0);
    }

    #[test]
    fn exactly_one_leader_per_release() {
        let barrier = StartBarrier::new(4);
        let waits: Vec<BarrierWait> = thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| barrier.arrive_and_wait().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(waits.iter().filter(|w| w.is_leader()).count(), 1);
        assert!(waits.iter().all(|w| w.generation() == 0));
        assert_eq!(barrier.releases(), 1);
    }

    #[test]
    fn nobody_passes_before_last_arrival() {
        let barrier = StartBarrier::new(3);
        let passed = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    barrier.arrive_and_wait().unwrap();
                    passed.fetch_add(1, Ordering::SeqCst);
                });
            }
            while barrier.waiting() < 2 {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(20));
            assert_eq!(passed.load(Ordering::SeqCst), 0);
            barrier.arrive_and_wait().unwrap();
        });
        assert_eq!(passed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn barrier_is_reusable() {
        let barrier = StartBarrier::new(2);
        thread::scope(|s| {
            for _ in 0..2 {
                s.spawn(|| {
                    for round in 0..5 {
                        let wait = barrier.arrive_and_wait().unwrap();
                        assert_eq!(wait.generation(), round);
                    }
                });
            }
        });
        assert_eq!(barrier.releases(), 5);
    }

    #[test]
    fn abort_wakes_waiters() {
        let barrier = StartBarrier::new(3);
        thread::scope(|s| {
            let waiter = s.spawn(|| barrier.arrive_and_wait());
            while barrier.waiting() < 1 {
                thread::yield_now();
            }
            barrier.abort();
            assert_eq!(waiter.join().unwrap(), Err(BarrierAborted));
        });
        assert!(barrier.is_aborted());
        assert_eq!(barrier.arrive_and_wait(), Err(BarrierAborted));
        assert_eq!(barrier.releases(), 0);
    }

    #[test]
    fn abort_after_release_keeps_result() {
        let barrier = StartBarrier::new(1);
        assert!(barrier.arrive_and_wait().is_ok());
        barrier.abort();
        assert_eq!(barrier.releases(), 1);
    }

    #[test]
    #[should_panic(expected = "barrier target must be at least 1")]
    fn zero_target_panics() {
        let _ = StartBarrier::new(0);
    }
}
