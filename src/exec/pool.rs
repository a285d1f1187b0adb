//! Fixed-size worker-pool execution context.

use super::{Context, ExecutionContext, Work};
use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// Configuration for a [`pool`] context.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Number of worker threads. Must be at least 1.
    pub threads: usize,
    /// Thread name prefix; workers are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            threads: 4,
            thread_name_prefix: "settle-pool".to_string(),
        }
    }
}

struct PoolShared {
    queue: SegQueue<Work>,
    shutdown: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
    label: String,
}

/// A context backed by a fixed set of worker threads sharing one queue.
///
/// Work may run on any worker; relative order is only guaranteed between
/// units that happen to land on the same worker. Dropping the last
/// handle shuts the workers down.
struct PoolContext {
    shared: Arc<PoolShared>,
}

impl ExecutionContext for PoolContext {
    fn execute(&self, work: Work) {
        self.shared.queue.push(work);
        let _guard = self.shared.mutex.lock().unwrap();
        self.shared.condvar.notify_one();
    }

    fn label(&self) -> &str {
        &self.shared.label
    }
}

impl Drop for PoolContext {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        let _guard = self.shared.mutex.lock().unwrap();
        self.shared.condvar.notify_all();
    }
}

/// Creates a worker pool with default options.
#[must_use]
pub fn pool(threads: usize) -> Context {
    pool_with(PoolOptions {
        threads,
        ..PoolOptions::default()
    })
}

/// Creates a worker pool from explicit options.
///
/// # Panics
///
/// Panics if `options.threads` is 0.
#[must_use]
pub fn pool_with(options: PoolOptions) -> Context {
    assert!(options.threads > 0, "pool needs at least one worker");

    let shared = Arc::new(PoolShared {
        queue: SegQueue::new(),
        shutdown: AtomicBool::new(false),
        mutex: Mutex::new(()),
        condvar: Condvar::new(),
        label: options.thread_name_prefix.clone(),
    });

    for index in 0..options.threads {
        let worker_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name(format!("{}-{index}", options.thread_name_prefix))
            .spawn(move || worker_loop(&worker_shared))
            .expect("failed to spawn pool worker");
    }

    Arc::new(PoolContext { shared })
}

fn worker_loop(shared: &PoolShared) {
    loop {
        if let Some(work) = shared.queue.pop() {
            work();
            continue;
        }
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        let guard = shared.mutex.lock().unwrap();
        if shared.queue.is_empty() && !shared.shutdown.load(Ordering::Acquire) {
            let _guard = shared.condvar.wait(guard).unwrap();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn wait_for(predicate: impl Fn() -> bool) {
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while !predicate() {
            assert!(std::time::Instant::now() < deadline, "timed out");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn executes_all_submitted_work() {
        let cx = pool(3);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..200 {
            let c = Arc::clone(&counter);
            cx.execute(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        wait_for(|| counter.load(Ordering::SeqCst) == 200);
    }

    #[test]
    fn spreads_work_across_workers() {
        let cx = pool(4);
        let names = Arc::new(parking_lot::Mutex::new(HashSet::new()));
        let barrier = Arc::new(std::sync::Barrier::new(4));
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let n = Arc::clone(&names);
            let b = Arc::clone(&barrier);
            let d = Arc::clone(&done);
            cx.execute(Box::new(move || {
                if let Some(name) = thread::current().name() {
                    n.lock().insert(name.to_string());
                }
                b.wait();
                d.fetch_add(1, Ordering::SeqCst);
            }));
        }

        wait_for(|| done.load(Ordering::SeqCst) == 4);
        assert_eq!(names.lock().len(), 4);
    }

    #[test]
    #[should_panic(expected = "at least one worker")]
    fn zero_workers_is_rejected() {
        let _ = pool(0);
    }
}
