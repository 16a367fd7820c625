//! Expiration Sweeper
//!
//! Background thread that periodically asks its cache to evict expired
//! entries.
//!
//! The sweeper is either idle (no thread) or active (thread waking every
//! interval). The owning store decides the transitions: it spawns a sweeper
//! when the first expirable entry is stored and drops it once a sweep finds
//! nothing left that can expire. Changing the interval wakes the waiting
//! thread so the new interval applies immediately.

use std::io;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::debug;

/// Name given to every sweeper thread.
const SWEEPER_THREAD_NAME: &str = "lazy-cache-sweeper";

/// Outcome of one sweep tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries looked at during the scan
    pub scanned: usize,
    /// Entries found expired by the scan
    pub expired: usize,
    /// Entries actually removed
    pub evicted: usize,
    /// Evictions vetoed by an `expiring` handler
    pub cancelled: usize,
    /// Entries replaced or removed between the scan and their eviction
    pub skipped: usize,
}

/// A cache the sweeper can tick.
pub(crate) trait SweepTarget: Send + Sync + 'static {
    fn sweep_tick(&self);
}

#[derive(Debug)]
struct SweepState {
    interval: Duration,
    stopped: bool,
}

#[derive(Debug)]
struct SweepControl {
    state: Mutex<SweepState>,
    wake: Condvar,
}

// == Sweeper ==
/// Handle to an active sweeper thread.
///
/// Dropping the handle stops the thread after its current tick. The thread
/// only holds a weak reference to its target, so it also exits once the
/// target is gone.
#[derive(Debug)]
pub(crate) struct Sweeper {
    control: Arc<SweepControl>,
}

impl Sweeper {
    // == Spawn ==
    /// Starts a sweeper thread ticking `target` every `interval`.
    ///
    /// # Arguments
    /// * `target` - Weak reference to the cache being swept
    /// * `interval` - Time between two ticks
    pub(crate) fn spawn<T: SweepTarget>(target: Weak<T>, interval: Duration) -> io::Result<Self> {
        let control = Arc::new(SweepControl {
            state: Mutex::new(SweepState {
                interval,
                stopped: false,
            }),
            wake: Condvar::new(),
        });
        let thread_control = Arc::clone(&control);

        thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || run(&thread_control, &target))?;

        debug!(?interval, "Expiration sweeper started");
        Ok(Self { control })
    }

    // == Reprogram ==
    /// Changes the interval without leaving the active state.
    pub(crate) fn reprogram(&self, interval: Duration) {
        let mut state = self.control.state.lock();
        state.interval = interval;
        self.control.wake.notify_one();
        debug!(?interval, "Expiration sweeper reprogrammed");
    }

    // == Stop ==
    /// Asks the thread to exit. Does not wait for it.
    pub(crate) fn stop(&self) {
        let mut state = self.control.state.lock();
        if !state.stopped {
            state.stopped = true;
            self.control.wake.notify_one();
            debug!("Expiration sweeper stopped");
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<T: SweepTarget>(control: &SweepControl, target: &Weak<T>) {
    let mut state = control.state.lock();

    loop {
        if state.stopped {
            break;
        }

        let interval = state.interval;
        let timed_out = control.wake.wait_for(&mut state, interval).timed_out();
        if state.stopped {
            break;
        }
        if !timed_out {
            // Woken by a reprogram (or spuriously): wait a full new interval
            continue;
        }

        let alive = MutexGuard::unlocked(&mut state, || match target.upgrade() {
            Some(target) => {
                target.sweep_tick();
                true
            }
            None => false,
        });
        if !alive {
            break;
        }
    }
}
