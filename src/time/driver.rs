//! The shared timer driver thread.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

/// A deadline plus the closure to run once it passes.
struct TimerEntry {
    deadline: Instant,
    seq: u64,
    work: Box<dyn FnOnce() + Send + 'static>,
}

// BinaryHeap is a max-heap; reverse the comparison so the earliest
// deadline surfaces first. `seq` breaks ties in scheduling order.
impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct DriverState {
    queue: BinaryHeap<TimerEntry>,
    next_seq: u64,
}

/// Owns the deadline heap; a dedicated thread drains it.
pub(crate) struct TimerDriver {
    state: Mutex<DriverState>,
    condvar: Condvar,
}

impl TimerDriver {
    fn new() -> Self {
        Self {
            state: Mutex::new(DriverState {
                queue: BinaryHeap::new(),
                next_seq: 0,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Returns the process-wide driver, starting its thread on first use.
    pub(crate) fn global() -> &'static Self {
        static DRIVER: OnceLock<&'static TimerDriver> = OnceLock::new();
        DRIVER.get_or_init(|| {
            let driver: &'static TimerDriver = Box::leak(Box::new(TimerDriver::new()));
            thread::Builder::new()
                .name("settle-timer".to_string())
                .spawn(move || driver.run())
                .expect("failed to spawn timer thread");
            driver
        })
    }

    /// Schedules `work` to run at least `delay` from now.
    pub(crate) fn schedule(&self, delay: Duration, work: impl FnOnce() + Send + 'static) {
        let deadline = Instant::now() + delay;
        {
            let mut state = self.state.lock();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.queue.push(TimerEntry {
                deadline,
                seq,
                work: Box::new(work),
            });
            tracing::trace!(delay_ms = delay.as_millis() as u64, seq, "timer scheduled");
        }
        self.condvar.notify_one();
    }

    fn run(&self) {
        let mut state = self.state.lock();
        loop {
            let Some(next_deadline) = state.queue.peek().map(|e| e.deadline) else {
                self.condvar.wait(&mut state);
                continue;
            };

            let now = Instant::now();
            if next_deadline <= now {
                let entry = state.queue.pop().expect("peeked entry vanished");
                // Fire outside the lock so the closure can reschedule.
                MutexGuard::unlocked(&mut state, || {
                    tracing::trace!(seq = entry.seq, "timer fired");
                    (entry.work)();
                });
            } else {
                let _ = self.condvar.wait_until(&mut state, next_deadline);
            }
        }
    }
}
