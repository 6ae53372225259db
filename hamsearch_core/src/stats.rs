use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counters owned by a running search session.
#[derive(Debug, Clone)]
pub struct Counters {
    pub hashes: u64,
    pub started: Instant,
}

impl Counters {
    pub fn start() -> Self {
        Self {
            hashes: 0,
            started: Instant::now(),
        }
    }

    pub fn record_hash(&mut self) {
        self.hashes = self.hashes.wrapping_add(1);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Snapshot of a finished (or in-progress) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub hashes: u64,
    pub elapsed: Duration,
    pub best_distance: u32,
}

impl RunStats {
    /// Captures the counters as of now.
    pub fn capture(counters: &Counters, best_distance: u32) -> Self {
        Self {
            hashes: counters.hashes,
            elapsed: counters.elapsed(),
            best_distance,
        }
    }

    /// Hashes per second over the whole run.
    ///
    /// With zero elapsed time the rate is `inf` (or `NaN` when nothing was
    /// hashed either); it is reported as-is.
    pub fn hashes_per_second(&self) -> f64 {
        self.hashes as f64 / self.elapsed.as_secs_f64()
    }
}

/// Counters a running search publishes for other threads.
///
/// Readers get a usable [`RunStats`] even while the search thread is stuck
/// inside a read that never returns.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    shared: Arc<PublishedCounters>,
}

#[derive(Debug)]
struct PublishedCounters {
    epoch: Instant,
    // nanoseconds from `epoch` to the start of the current run
    started: AtomicU64,
    hashes: AtomicU64,
    best_distance: AtomicU32,
}

impl SearchProgress {
    pub fn new(best_distance: u32) -> Self {
        Self {
            shared: Arc::new(PublishedCounters {
                epoch: Instant::now(),
                started: AtomicU64::new(0),
                hashes: AtomicU64::new(0),
                best_distance: AtomicU32::new(best_distance),
            }),
        }
    }

    /// Records the start of a run described by freshly started `counters`.
    pub fn begin(&self, counters: &Counters, best_distance: u32) {
        let offset = counters.started.saturating_duration_since(self.shared.epoch);
        let offset = u64::try_from(offset.as_nanos()).unwrap_or(u64::MAX);
        self.shared.started.store(offset, Ordering::Release);
        self.publish(counters, best_distance);
    }

    pub fn publish(&self, counters: &Counters, best_distance: u32) {
        self.shared.best_distance.store(best_distance, Ordering::Relaxed);
        self.shared.hashes.store(counters.hashes, Ordering::Release);
    }

    /// Statistics as of the last publish, timed up to now.
    pub fn snapshot(&self) -> RunStats {
        let hashes = self.shared.hashes.load(Ordering::Acquire);
        let best_distance = self.shared.best_distance.load(Ordering::Relaxed);
        let started = self.shared.epoch
            + Duration::from_nanos(self.shared.started.load(Ordering::Acquire));
        RunStats {
            hashes,
            elapsed: Instant::now().saturating_duration_since(started),
            best_distance,
        }
    }
}
