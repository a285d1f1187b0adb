//! Predicate polling.

use crate::exec::Context;
use crate::future::{catch_user, Future, ResolvableFuture};
use crate::time::TimerDriver;
use std::time::Duration;

/// Options for [`Future::resolve_when_with`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Time between predicate evaluations.
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl Future<bool> {
    /// Evaluates `predicate` on `cx` at the default interval until it
    /// returns true, then resolves with `true`. Cancelling the returned
    /// future stops the polling.
    pub fn resolve_when<P>(cx: &Context, predicate: P) -> Future<bool>
    where
        P: Fn() -> bool + Send + 'static,
    {
        Self::resolve_when_with(cx, PollOptions::default(), predicate)
    }

    /// [`resolve_when`](Self::resolve_when) with an explicit interval.
    pub fn resolve_when_with<P>(cx: &Context, options: PollOptions, predicate: P) -> Future<bool>
    where
        P: Fn() -> bool + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        poll_step(cx.clone(), options.interval, predicate, downstream.clone());
        downstream.future()
    }
}

fn poll_step<P>(cx: Context, interval: Duration, predicate: P, out: ResolvableFuture<bool>)
where
    P: Fn() -> bool + Send + 'static,
{
    let next_cx = cx.clone();
    cx.execute(Box::new(move || {
        if out.is_completed() {
            tracing::trace!("polling stopped: future already settled");
            return;
        }
        match catch_user(|| predicate()) {
            Ok(true) => out.resolve(true),
            Ok(false) => {
                TimerDriver::global().schedule(interval, move || {
                    poll_step(next_cx, interval, predicate, out);
                });
            }
            Err(panic_error) => out.fail(panic_error),
        }
    }));
}
