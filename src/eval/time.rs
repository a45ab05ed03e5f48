use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source, measured from an arbitrary fixed epoch.
pub trait Clock: Send {
    /// Current time since the clock's epoch.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Settable clock for deterministic tests and headless drivers.
///
/// Clones share the same time value.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        let add = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(add))
            });
    }

    /// Jump to an absolute time since the epoch.
    pub fn set(&self, t: Duration) {
        let n = u64::try_from(t.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(n, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Running-time accumulator that freezes across pauses.
///
/// Reported time is the sum of every running interval since [`TimeAccumulator::start`]; paused
/// intervals contribute nothing, however long they last.
pub struct TimeAccumulator {
    clock: Box<dyn Clock>,
    origin: Duration,
    banked: Duration,
    running: bool,
}

impl std::fmt::Debug for TimeAccumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeAccumulator")
            .field("origin", &self.origin)
            .field("banked", &self.banked)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl TimeAccumulator {
    /// Create an accumulator that is already running from `clock.now()`.
    pub fn start(clock: Box<dyn Clock>) -> Self {
        let origin = clock.now();
        Self {
            clock,
            origin,
            banked: Duration::ZERO,
            running: true,
        }
    }

    /// Bank the current running interval and stop. No-op when already paused.
    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.banked += self.clock.now().saturating_sub(self.origin);
        self.running = false;
    }

    /// Start a new running interval. No-op when already running.
    pub fn resume(&mut self) {
        if self.running {
            return;
        }
        self.origin = self.clock.now();
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Total running time.
    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.banked + self.clock.now().saturating_sub(self.origin)
        } else {
            self.banked
        }
    }

    /// Total running time in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/time.rs"]
mod tests;
