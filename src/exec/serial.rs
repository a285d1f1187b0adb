//! Single-threaded serial execution context.

use super::{Context, ExecutionContext, Work};
use crossbeam_queue::SegQueue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

/// A context backed by one worker thread draining a FIFO queue.
///
/// Work submitted from any thread runs in submission order on the
/// worker. Dropping the last handle shuts the worker down; queued work
/// that has not started by then is discarded.
struct SerialContext {
    shared: Arc<SerialShared>,
}

struct SerialShared {
    queue: SegQueue<Work>,
    shutdown: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
    label: String,
}

impl SerialShared {
    fn notify(&self) {
        let _guard = self.mutex.lock().unwrap();
        self.condvar.notify_one();
    }
}

impl ExecutionContext for SerialContext {
    fn execute(&self, work: Work) {
        self.shared.queue.push(work);
        self.shared.notify();
    }

    fn label(&self) -> &str {
        &self.shared.label
    }
}

impl Drop for SerialContext {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.notify();
    }
}

/// Creates a serial context with the given thread name.
#[must_use]
pub fn serial(name: &str) -> Context {
    let shared = Arc::new(SerialShared {
        queue: SegQueue::new(),
        shutdown: AtomicBool::new(false),
        mutex: Mutex::new(()),
        condvar: Condvar::new(),
        label: name.to_string(),
    });

    let worker_shared = Arc::clone(&shared);
    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || worker_loop(&worker_shared))
        .expect("failed to spawn serial worker");

    Arc::new(SerialContext { shared })
}

fn worker_loop(shared: &SerialShared) {
    loop {
        if let Some(work) = shared.queue.pop() {
            work();
            continue;
        }
        if shared.shutdown.load(Ordering::Acquire) {
            break;
        }
        let guard = shared.mutex.lock().unwrap();
        // Re-check under the lock so a push+notify between the pop and
        // the park is not lost.
        if shared.queue.is_empty() && !shared.shutdown.load(Ordering::Acquire) {
            let _guard = shared.condvar.wait(guard).unwrap();
        }
    }
}
