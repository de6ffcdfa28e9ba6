//! Statistics aggregation and the end-of-run report.

use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use prt_arena::ArenaUsage;

use crate::backend::GeometrySummary;
use crate::shared::{SharedState, TimingTable};

/// Min, max, and average of the per-worker elapsed times.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkerTimingSummary {
    /// Sum of every sample.
    pub total: Duration,
    /// Shortest sample.
    pub min: Duration,
    /// Longest sample.
    pub max: Duration,
    /// `total / worker_count`, divided in floating point.
    pub average: Duration,
}

impl WorkerTimingSummary {
    /// Summarize `samples` over `worker_count` workers.
    ///
    /// The result does not depend on sample order. Returns `None` when
    /// there are no samples or no workers.
    pub fn from_timings(samples: &[Duration], worker_count: usize) -> Option<Self> {
        if worker_count == 0 {
            return None;
        }
        let min = samples.iter().copied().min()?;
        let max = samples.iter().copied().max()?;
        let total: Duration = samples.iter().sum();
        let average_nanos = total.as_nanos() as f64 / worker_count as f64;
        Some(Self {
            total,
            min,
            max,
            average: Duration::from_nanos(average_nanos.round() as u64),
        })
    }
}

/// Everything measured about one render.
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Number of workers.
    pub workers: usize,
    /// Counts reported by the geometry loader.
    pub geometry: GeometrySummary,
    /// Wall-clock time just before the first spawn.
    pub started_at: SystemTime,
    /// Wall-clock time just after the last join.
    pub finished_at: SystemTime,
    /// Spawn to join.
    pub with_initialization: Duration,
    /// Barrier release (as seen by worker 0) to join.
    pub without_initialization: Option<Duration>,
    /// Per-worker elapsed times, indexed by worker id.
    pub worker_timings: TimingTable,
    /// Summary of `worker_timings`, in per-worker stats mode only.
    pub per_worker: Option<WorkerTimingSummary>,
    /// Ray ids handed out by the shared counter.
    pub rays_issued: u64,
    /// Arena usage after the last join.
    pub arena: ArenaUsage,
}

impl RunReport {
    /// Aggregate `shared` once every worker has joined.
    pub fn aggregate(
        shared: &SharedState,
        geometry: GeometrySummary,
        wall: (SystemTime, SystemTime),
        spawned_at: Instant,
        joined_at: Instant,
    ) -> Self {
        let worker_timings = shared.timing_table();
        let per_worker = if shared.per_worker_stats() {
            let samples: Vec<Duration> = worker_timings.iter().flatten().copied().collect();
            WorkerTimingSummary::from_timings(&samples, shared.worker_count())
        } else {
            None
        };
        Self {
            workers: shared.worker_count(),
            geometry,
            started_at: wall.0,
            finished_at: wall.1,
            with_initialization: joined_at.saturating_duration_since(spawned_at),
            without_initialization: shared
                .parallel_start()
                .map(|start| joined_at.saturating_duration_since(start)),
            worker_timings,
            per_worker,
            rays_issued: shared.rays_issued(),
            arena: shared.arena().usage(),
        }
    }
}

fn unix_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "TIMING STATISTICS MEASURED BY MAIN PROCESS:")?;
        writeln!(
            f,
            "        Overall start time     {:20.3}",
            unix_seconds(self.started_at)
        )?;
        writeln!(
            f,
            "        Overall end time       {:20.3}",
            unix_seconds(self.finished_at)
        )?;
        writeln!(
            f,
            "        Total time with initialization     {:14.3} ms",
            millis(self.with_initialization)
        )?;
        match self.without_initialization {
            Some(d) => writeln!(
                f,
                "        Total time without initialization  {:14.3} ms",
                millis(d)
            )?,
            None => writeln!(f, "        Total time without initialization  unavailable")?,
        }
        writeln!(f, "        Rays traced                        {:14}", self.rays_issued)?;
        writeln!(
            f,
            "        Arena peak usage                   {:14} bytes",
            self.arena.peak
        )?;

        if let Some(summary) = &self.per_worker {
            writeln!(f)?;
            writeln!(f, "PER-PROCESS STATISTICS:")?;
            writeln!(f, "{:>20}{:>20}", "Proc", "Time (ms)")?;
            for (id, slot) in self.worker_timings.iter().enumerate() {
                match slot {
                    Some(d) => writeln!(f, "{:>20}{:>20.3}", id, millis(*d))?,
                    None => writeln!(f, "{:>20}{:>20}", id, "-")?,
                }
            }
            writeln!(f, "{:>20}{:>20.3}", "Max =", millis(summary.max))?;
            writeln!(f, "{:>20}{:>20.3}", "Min =", millis(summary.min))?;
            writeln!(f, "{:>20}{:>20.3}", "Avg =", millis(summary.average))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use prt_arena::{ArenaConfig, GlobalArena};
    use prt_core::WorkerId;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn summary_of_three_workers() {
        let s = WorkerTimingSummary::from_timings(&[ms(10), ms(20), ms(30)], 3).unwrap();
        assert_eq!(s.min, ms(10));
        assert_eq!(s.max, ms(30));
        assert_eq!(s.total, ms(60));
        assert_eq!(s.average, ms(20));
    }

    #[test]
    fn average_does_not_truncate() {
        let s = WorkerTimingSummary::from_timings(&[Duration::from_nanos(1), Duration::from_nanos(2)], 2)
            .unwrap();
        assert_eq!(s.average, Duration::from_nanos(2));
    }

    #[test]
    fn empty_input_has_no_summary() {
        assert!(WorkerTimingSummary::from_timings(&[], 3).is_none());
        assert!(WorkerTimingSummary::from_timings(&[ms(1)], 0).is_none());
    }

    #[test]
    fn report_aggregates_stats_mode() {
        let arena = GlobalArena::init(ArenaConfig::new(1024)).unwrap();
        let config = RunConfig {
            per_worker_stats: true,
            ..RunConfig::with_workers(3)
        };
        let shared = SharedState::new(&config, arena).unwrap();
        for (id, t) in [(2, 30), (0, 10), (1, 20)] {
            shared.record_elapsed(WorkerId(id), ms(t)).unwrap();
        }
        let spawn = Instant::now();
        shared.mark_parallel_start(spawn + ms(5));
        let join = spawn + ms(40);
        let now = SystemTime::now();
        let report = RunReport::aggregate(&shared, GeometrySummary::default(), (now, now), spawn, join);

        assert_eq!(report.with_initialization, ms(40));
        assert_eq!(report.without_initialization, Some(ms(35)));
        let summary = report.per_worker.unwrap();
        assert_eq!((summary.min, summary.max, summary.average), (ms(10), ms(30), ms(20)));

        let text = report.to_string();
        assert!(text.contains("TIMING STATISTICS MEASURED BY MAIN PROCESS:"));
        assert!(text.contains("PER-PROCESS STATISTICS:"));
        assert!(text.contains("Avg ="));
    }

    #[test]
    fn report_without_stats_mode_omits_table() {
        let arena = GlobalArena::init(ArenaConfig::new(1024)).unwrap();
        let shared = SharedState::new(&RunConfig::with_workers(2), arena).unwrap();
        shared.record_elapsed(WorkerId(0), ms(7)).unwrap();
        let t = Instant::now();
        let now = SystemTime::now();
        let report = RunReport::aggregate(&shared, GeometrySummary::default(), (now, now), t, t);
        assert!(report.per_worker.is_none());
        assert_eq!(report.worker_timings.as_slice(), &[Some(ms(7)), None]);
        assert!(report.without_initialization.is_none());
        assert!(!report.to_string().contains("PER-PROCESS"));
    }
}
