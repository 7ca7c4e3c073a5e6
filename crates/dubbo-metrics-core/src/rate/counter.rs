//! Sliding-window request counter.
//!
//! Events are tallied per wall-clock second in a fixed ring of
//! `RETAINED_SECONDS + 1` slots. A slot is tagged with the second it counts,
//! so a stale slot is recycled the moment a newer second maps onto it. A
//! background tokio task sweeps once per second and clears every slot older
//! than `now - RETAINED_SECONDS`.
//!
//! `rate()` reports the most recently *completed* second. The in-progress
//! second is never visible.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::clock::{Clock, SystemClock};

/// Seconds of history kept behind the current one.
pub const RETAINED_SECONDS: i64 = 5;

/// Period of the background sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

const SLOTS: usize = RETAINED_SECONDS as usize + 1;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    second: i64,
    count: u64,
}

#[derive(Debug, Default)]
struct Window {
    slots: [Slot; SLOTS],
}

impl Window {
    fn index(second: i64) -> usize {
        // rem_euclid keeps pre-epoch seconds in range.
        second.rem_euclid(SLOTS as i64) as usize
    }

    fn record(&mut self, second: i64) {
        let slot = &mut self.slots[Self::index(second)];
        if slot.second != second {
            slot.second = second;
            slot.count = 0;
        }
        slot.count = slot.count.saturating_add(1);
    }

    fn count_at(&self, second: i64) -> u64 {
        let slot = &self.slots[Self::index(second)];
        if slot.second == second {
            slot.count
        } else {
            0
        }
    }

    /// Clear slots strictly older than `cutoff`. Returns how many were live.
    fn evict_before(&mut self, cutoff: i64) -> usize {
        let mut evicted = 0;
        for slot in self.slots.iter_mut() {
            if slot.count > 0 && slot.second < cutoff {
                *slot = Slot::default();
                evicted += 1;
            }
        }
        evicted
    }

    fn live(&self) -> Vec<(i64, u64)> {
        let mut out: Vec<(i64, u64)> = self
            .slots
            .iter()
            .filter(|s| s.count > 0)
            .map(|s| (s.second, s.count))
            .collect();
        out.sort_unstable();
        out
    }
}

fn sweep_window(window: &Mutex<Window>, now_secs: i64) -> usize {
    // Poisoned lock means a panic elsewhere; skip rather than propagate.
    match window.lock() {
        Ok(mut w) => w.evict_before(now_secs - RETAINED_SECONDS),
        Err(_) => 0,
    }
}

/// Per-second event counter with a one-second reporting lag.
pub struct RateCounter {
    clock: Arc<dyn Clock>,
    window: Arc<Mutex<Window>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateCounter {
    /// Counter on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Counter on an explicit clock.
    ///
    /// The periodic sweep is spawned on the ambient tokio runtime. Without a
    /// runtime the counter still works; stale slots are then only recycled
    /// when a newer second lands on them.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let window = Arc::new(Mutex::new(Window::default()));
        let sweeper = spawn_sweeper(Arc::clone(&clock), Arc::clone(&window));
        Self {
            clock,
            window,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Floor of the clock in whole seconds.
    pub fn current_second(&self) -> i64 {
        self.clock.now_secs()
    }

    /// Record one event in the current second.
    pub fn increment(&self) {
        let now = self.current_second();
        if let Ok(mut w) = self.window.lock() {
            w.record(now);
        }
    }

    /// Events recorded during the previous (completed) second; 0 if none.
    pub fn rate(&self) -> u64 {
        let prev = self.current_second() - 1;
        self.window.lock().map(|w| w.count_at(prev)).unwrap_or(0)
    }

    /// Drop every bucket older than `current_second() - RETAINED_SECONDS`.
    /// Returns the number of buckets removed. The background task calls this
    /// once per `SWEEP_INTERVAL`.
    pub fn sweep(&self) -> usize {
        sweep_window(&self.window, self.current_second())
    }

    /// Live buckets as `(second, count)`, oldest first.
    pub fn buckets(&self) -> Vec<(i64, u64)> {
        self.window.lock().map(|w| w.live()).unwrap_or_default()
    }

    /// Whether the background sweep task is still scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .map(|g| g.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Cancel the background sweep. Safe to call repeatedly.
    pub fn stop(&self) {
        let handle = match self.sweeper.lock() {
            Ok(mut g) => g.take(),
            Err(_) => None,
        };
        if let Some(h) = handle {
            h.abort();
            tracing::debug!("rate counter sweep stopped");
        }
    }
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RateCounter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_sweeper(clock: Arc<dyn Clock>, window: Arc<Mutex<Window>>) -> Option<JoinHandle<()>> {
    let Ok(rt) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("no tokio runtime; rate counter sweep disabled");
        return None;
    };

    let handle = rt.spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let evicted = sweep_window(&window, clock.now_secs());
            if evicted > 0 {
                tracing::trace!(evicted, "rate counter buckets expired");
            }
        }
    });
    tracing::debug!("rate counter sweep started");
    Some(handle)
}
