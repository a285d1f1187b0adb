//! A manually drained context for deterministic tests.

use super::{ExecutionContext, Work};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Queues submitted work until a test drains it.
///
/// Nothing runs until [`run_one`](ManualContext::run_one) or
/// [`run_all`](ManualContext::run_all) is called, so tests control
/// exactly when and in what order callbacks fire.
#[derive(Default)]
pub struct ManualContext {
    queue: Mutex<VecDeque<Work>>,
}

impl std::fmt::Debug for ManualContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualContext")
            .field("pending", &self.queue.lock().len())
            .finish()
    }
}

impl ManualContext {
    /// Creates an empty manual context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the oldest queued unit of work, if any.
    ///
    /// Returns true if a unit ran.
    pub fn run_one(&self) -> bool {
        let work = self.queue.lock().pop_front();
        match work {
            Some(work) => {
                work();
                true
            }
            None => false,
        }
    }

    /// Runs queued work until the queue is empty, including work enqueued
    /// by the work being run. Returns how many units ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_one() {
            ran += 1;
        }
        ran
    }

    /// Number of units currently queued.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }
}

impl ExecutionContext for ManualContext {
    fn execute(&self, work: Work) {
        self.queue.lock().push_back(work);
    }

    fn label(&self) -> &str {
        "manual"
    }
}
