//! Aggregation of per-worker timing tables.

use std::time::{Duration, Instant, SystemTime};

use proptest::prelude::*;
use prt_arena::{ArenaConfig, GlobalArena};
use prt_core::WorkerId;
use prt_engine::{GeometrySummary, RunConfig, RunReport, SharedState, WorkerTimingSummary};

fn stats_state(workers: usize) -> SharedState {
    let config = RunConfig {
        per_worker_stats: true,
        ..RunConfig::with_workers(workers)
    };
    let arena = GlobalArena::init(ArenaConfig::new(1 << 12)).unwrap();
    SharedState::new(&config, arena).unwrap()
}

#[test]
fn three_workers_ten_twenty_thirty() {
    let shared = stats_state(3);
    for (worker, ms) in [(0, 10), (1, 20), (2, 30)] {
        shared
            .record_elapsed(WorkerId(worker), Duration::from_millis(ms))
            .unwrap();
    }
    let t = Instant::now();
    let now = SystemTime::now();
    let report = RunReport::aggregate(&shared, GeometrySummary::default(), (now, now), t, t);
    let summary = report.per_worker.unwrap();
    assert_eq!(summary.min, Duration::from_millis(10));
    assert_eq!(summary.max, Duration::from_millis(30));
    assert_eq!(summary.average, Duration::from_millis(20));
}

proptest! {
    #[test]
    fn write_order_does_not_change_summary(
        times in prop::collection::vec(0u64..10_000_000, 1..=16),
        seed in any::<u64>(),
    ) {
        let n = times.len();

        // Write slots in a seed-dependent order.
        let mut order: Vec<usize> = (0..n).collect();
        let mut s = seed;
        for i in (1..n).rev() {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            order.swap(i, (s >> 33) as usize % (i + 1));
        }

        let in_order = stats_state(n);
        let shuffled = stats_state(n);
        for (i, t) in times.iter().enumerate() {
            in_order.record_elapsed(WorkerId(i as u32), Duration::from_micros(*t)).unwrap();
        }
        for &i in &order {
            shuffled.record_elapsed(WorkerId(i as u32), Duration::from_micros(times[i])).unwrap();
        }

        let t = Instant::now();
        let now = SystemTime::now();
        let a = RunReport::aggregate(&in_order, GeometrySummary::default(), (now, now), t, t);
        let b = RunReport::aggregate(&shuffled, GeometrySummary::default(), (now, now), t, t);
        prop_assert_eq!(a.per_worker, b.per_worker);

        let mut reversed: Vec<Duration> = times.iter().rev().map(|t| Duration::from_micros(*t)).collect();
        let forward = WorkerTimingSummary::from_timings(&reversed, n);
        reversed.sort();
        prop_assert_eq!(forward, WorkerTimingSummary::from_timings(&reversed, n));
    }
}
