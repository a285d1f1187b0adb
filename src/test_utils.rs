//! Shared helpers for unit and integration tests:
//! - tracing-based logging initialization
//! - a paired [`ManualContext`] constructor
//! - a spin-wait for cross-thread effects
//! - terminal-state assertion macros

use crate::exec::{Context, ManualContext};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

/// Initialize test logging at debug level.
///
/// Safe to call multiple times; only the first call initializes.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// A [`ManualContext`] together with its type-erased handle.
#[must_use]
pub fn manual_pair() -> (Arc<ManualContext>, Context) {
    let manual = Arc::new(ManualContext::new());
    let context: Context = manual.clone();
    (manual, context)
}

/// Spins until `predicate` holds or `limit` elapses; true on success.
pub fn eventually(limit: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while !predicate() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Assert that a future has resolved with a specific value.
#[macro_export]
macro_rules! assert_done {
    ($future:expr, $expected:expr) => {
        match $future.settled() {
            Some($crate::Settled::Done(v)) => assert_eq!(v, $expected),
            other => panic!("expected Done({:?}), got {:?}", $expected, other),
        }
    };
}

/// Assert that a future has failed.
#[macro_export]
macro_rules! assert_failed {
    ($future:expr) => {
        match $future.settled() {
            Some($crate::Settled::Failed(_)) => {}
            other => panic!("expected Failed, got {other:?}"),
        }
    };
}

/// Assert that a future has been cancelled.
#[macro_export]
macro_rules! assert_cancelled {
    ($future:expr) => {
        match $future.settled() {
            Some($crate::Settled::Cancelled) => {}
            other => panic!("expected Cancelled, got {other:?}"),
        }
    };
}
