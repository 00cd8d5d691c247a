//! Sweep scheduler - checks every known monitor on a fixed cadence.
//!
//! A [`Ticker`] decides when sweeps happen; the scheduler only reacts to
//! ticks, so tests drive it with [`ChannelTicker`] instead of real time.
//!
//! ## Overlapping sweeps
//! A tick that arrives while a sweep is still in flight is skipped and
//! counted in [`SweepStats::sweeps_skipped`]. Each skipped tick delays the
//! next heartbeat of every monitor by up to one interval. A sweep is bounded
//! by `ceil(monitors / concurrency) * probe timeout` plus store latency, so
//! with the defaults (5 s timeout, 16 concurrent checks, 5 min interval) a
//! skip needs roughly a thousand monitors before it can happen.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use crate::probe::{CheckReport, ProbeExecutor};
use crate::store::MonitorSource;

/// Source of periodic triggers
#[async_trait::async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick; `false` means no more ticks will come
    async fn tick(&mut self) -> bool;
}

/// Ticks on a fixed period
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// First tick fires immediately when `fire_immediately` is set,
    /// otherwise after one full period
    pub fn new(period: Duration, fire_immediately: bool) -> Self {
        let start = if fire_immediately { Instant::now() } else { Instant::now() + period };
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait::async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks whenever a message arrives; ends when every sender is dropped
pub struct ChannelTicker {
    rx: mpsc::Receiver<()>,
}

impl ChannelTicker {
    pub fn new(buffer: usize) -> (mpsc::Sender<()>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self { rx })
    }
}

#[async_trait::async_trait]
impl Ticker for ChannelTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Running counters kept by the scheduler
#[derive(Debug, Default)]
pub struct SweepStats {
    sweeps_started: AtomicU64,
    sweeps_skipped: AtomicU64,
    listing_failures: AtomicU64,
    checks_completed: AtomicU64,
    heartbeats_written: AtomicU64,
    missed_checks: AtomicU64,
}

/// Point-in-time copy of [`SweepStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepStatsSnapshot {
    pub sweeps_started: u64,
    pub sweeps_skipped: u64,
    pub listing_failures: u64,
    pub checks_completed: u64,
    pub heartbeats_written: u64,
    /// Checks whose heartbeat could not be stored
    pub missed_checks: u64,
}

impl SweepStats {
    pub fn snapshot(&self) -> SweepStatsSnapshot {
        SweepStatsSnapshot {
            sweeps_started: self.sweeps_started.load(Ordering::Relaxed),
            sweeps_skipped: self.sweeps_skipped.load(Ordering::Relaxed),
            listing_failures: self.listing_failures.load(Ordering::Relaxed),
            checks_completed: self.checks_completed.load(Ordering::Relaxed),
            heartbeats_written: self.heartbeats_written.load(Ordering::Relaxed),
            missed_checks: self.missed_checks.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Clears the in-flight flag when a sweep ends, including by panic
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sweep scheduler - dispatches one probe per monitor on every tick
pub struct SweepScheduler {
    monitors: Arc<dyn MonitorSource>,
    executor: Arc<ProbeExecutor>,
    concurrency: usize,
    in_flight: AtomicBool,
    stats: SweepStats,
}

impl SweepScheduler {
    pub fn new(monitors: Arc<dyn MonitorSource>, executor: Arc<ProbeExecutor>, concurrency: usize) -> Self {
        Self {
            monitors,
            executor,
            concurrency: concurrency.max(1),
            in_flight: AtomicBool::new(false),
            stats: SweepStats::default(),
        }
    }

    pub fn stats(&self) -> SweepStatsSnapshot {
        self.stats.snapshot()
    }

    /// Check every monitor once
    ///
    /// Failures are contained: a failing check only affects its own
    /// monitor, and a failed listing abandons this sweep alone. Returns
    /// immediately if another sweep is still running.
    pub async fn run_sweep(&self) {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            SweepStats::bump(&self.stats.sweeps_skipped);
            warn!("Previous sweep still running, skipping this tick");
            return;
        }
        let _guard = InFlight(&self.in_flight);

        SweepStats::bump(&self.stats.sweeps_started);

        let monitors = match self.monitors.list_all_monitors().await {
            Ok(monitors) => monitors,
            Err(e) => {
                SweepStats::bump(&self.stats.listing_failures);
                error!("Failed to fetch monitors, abandoning sweep: {}", e);
                return;
            }
        };

        info!("Checking {} monitor(s)...", monitors.len());

        let started = Instant::now();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut checks = JoinSet::new();

        for monitor in monitors {
            let Ok(permit) = permits.clone().acquire_owned().await else {
                break;
            };
            let executor = Arc::clone(&self.executor);

            checks.spawn(async move {
                let _permit = permit;
                executor.check_monitor(&monitor).await
            });
        }

        let mut written = 0u64;
        let mut missed = 0u64;

        while let Some(joined) = checks.join_next().await {
            SweepStats::bump(&self.stats.checks_completed);
            match joined {
                Ok(CheckReport::Recorded(heartbeat)) => {
                    written += 1;
                    SweepStats::bump(&self.stats.heartbeats_written);
                    debug!(monitor_id = %heartbeat.monitor_id, heartbeat_id = heartbeat.id, "Heartbeat recorded");
                }
                Ok(CheckReport::Missed { observation, .. }) => {
                    missed += 1;
                    SweepStats::bump(&self.stats.missed_checks);
                    debug!(monitor_id = %observation.monitor_id, "Missed check");
                }
                Err(e) => {
                    missed += 1;
                    SweepStats::bump(&self.stats.missed_checks);
                    error!("Monitor check task failed: {}", e);
                }
            }
        }

        info!(
            "Sweep finished in {}ms: {} heartbeat(s) written, {} missed",
            started.elapsed().as_millis(),
            written,
            missed
        );
    }

    /// Run a sweep on every tick until the ticker ends
    ///
    /// Sweeps run in their own tasks so that a slow sweep does not hold up
    /// the ticker; see the module docs for what happens on overlap.
    pub async fn run<T: Ticker>(self: Arc<Self>, mut ticker: T) {
        let mut sweeps = JoinSet::new();

        while ticker.tick().await {
            debug!("Tick received, starting sweep");
            let scheduler = Arc::clone(&self);
            sweeps.spawn(async move { scheduler.run_sweep().await });

            // Reap finished sweeps so the set does not grow without bound
            while let Some(done) = sweeps.try_join_next() {
                if let Err(e) = done {
                    error!("Sweep task failed: {}", e);
                }
            }
        }

        info!("Ticker closed, waiting for running sweeps");
        while let Some(done) = sweeps.join_next().await {
            if let Err(e) = done {
                error!("Sweep task failed: {}", e);
            }
        }
    }
}
