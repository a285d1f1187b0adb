//! The future handle: the read-and-cancel surface of a record.
//!
//! A [`Future`] resolves at most once into `Done`, `Failed`, or
//! `Cancelled`. Handles are cheap clones of a shared record; the write
//! side is [`ResolvableFuture`]. Callbacks are delivered through
//! caller-chosen [execution contexts](crate::exec), in installation
//! order, exactly once each.
//!
//! # Cancellation
//!
//! `cancel` drives a running record to `Cancelled`, fires the record's
//! cancellation responder (if one was installed), and then the ordinary
//! completion callbacks. The returned `Future<()>` acknowledges
//! cancellation: it settles when the responder's future settles, or
//! immediately when there is no responder or the record was already
//! terminal. Repeated calls return the same acknowledgement handle.

mod record;
mod resolvable;

pub use resolvable::ResolvableFuture;

pub(crate) use record::{Callback, Phase, Responder, Shared};

use crate::error::{ErrorInfo, WaitError};
use crate::exec::{inline, Context};
use crate::types::{Settled, State};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// A single-resolution asynchronous result.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Future").field("state", &self.state()).finish()
    }
}

impl<T> Future<T> {
    pub(crate) fn from_shared(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Creates a future already resolved with `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::from_shared(Shared::new_settled(Settled::Done(value)))
    }

    /// Creates a future already failed with `error`.
    #[must_use]
    pub fn with_error(error: ErrorInfo) -> Self {
        Self::from_shared(Shared::new_settled(Settled::Failed(error)))
    }

    /// The current state; a snapshot that can only move toward a
    /// terminal state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// True once the future has left `Running`.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.state().is_terminal()
    }

    /// The error, if the future has failed.
    #[must_use]
    pub fn error(&self) -> Option<ErrorInfo> {
        self.shared.error()
    }

    /// True when both handles view the same record.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.shared, &b.shared)
    }

    /// Returns a handle that does not keep the record alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakFuture<T> {
        WeakFuture {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl<T: Clone> Future<T> {
    /// The terminal snapshot, if the future has completed.
    #[must_use]
    pub fn settled(&self) -> Option<Settled<T>> {
        match &self.shared.inner.lock().phase {
            Phase::Settled(s) => Some(s.clone()),
            Phase::Running(_) => None,
        }
    }

    /// The value, if the future has resolved successfully.
    #[must_use]
    pub fn value(&self) -> Option<T> {
        match self.settled() {
            Some(Settled::Done(v)) => Some(v),
            _ => None,
        }
    }

    /// Snapshot for callbacks, which only run after the terminal
    /// transition.
    pub(crate) fn settled_now(&self) -> Settled<T> {
        self.settled().expect("callback ran before terminal transition")
    }
}

impl<T: Send + 'static> Future<T> {
    pub(crate) fn new_running() -> Self {
        Self::from_shared(Shared::new_running())
    }

    /// Installs a completion callback dispatched on `cx`.
    ///
    /// Callbacks installed before completion fire in installation order.
    /// Installing on an already-completed future schedules the callback
    /// on `cx` immediately — never inline on the installing thread,
    /// unless `cx` is the [`inline`](crate::exec::inline) context.
    pub fn on_completion<F>(&self, cx: &Context, f: F) -> &Self
    where
        F: FnOnce(&Future<T>) + Send + 'static,
    {
        let already = {
            let mut inner = self.shared.inner.lock();
            match &mut inner.phase {
                Phase::Running(pending) => {
                    pending.callbacks.push((cx.clone(), Box::new(f)));
                    None
                }
                Phase::Settled(_) => Some(Box::new(f) as Callback<T>),
            }
        };
        if let Some(callback) = already {
            tracing::trace!(context = cx.label(), "scheduling callback on completed future");
            let handle = self.clone();
            cx.execute(Box::new(move || callback(&handle)));
        }
        self
    }

    /// Requests cancellation.
    ///
    /// On a running future this drives the state to `Cancelled`, fires
    /// the cancellation responder if one is installed, and dispatches
    /// completion callbacks. On a terminal future it is a no-op whose
    /// acknowledgement resolves immediately. Every call returns the same
    /// acknowledgement handle.
    pub fn cancel(&self) -> Future<()> {
        self.cancel_with_flag().0
    }

    /// Like [`cancel`](Self::cancel), also reporting whether this call
    /// performed the transition.
    pub(crate) fn cancel_with_flag(&self) -> (Future<()>, bool) {
        let (ack, fired) = {
            let mut inner = self.shared.inner.lock();
            match &inner.phase {
                Phase::Settled(_) => {
                    let ack = inner
                        .cancel_future
                        .get_or_insert_with(|| Future::with_value(()))
                        .clone();
                    (ack, None)
                }
                Phase::Running(_) => {
                    let Phase::Running(pending) =
                        std::mem::replace(&mut inner.phase, Phase::Settled(Settled::Cancelled))
                    else {
                        unreachable!("phase changed while locked")
                    };
                    let resolver = ResolvableFuture::<()>::new();
                    let ack = resolver.future();
                    inner.cancel_future = Some(ack.clone());
                    (ack, Some((pending, resolver)))
                }
            }
        };

        let Some((pending, resolver)) = fired else {
            return (ack, false);
        };

        self.shared.completed.notify_all();
        tracing::debug!("future cancelled");

        match pending.responder {
            Some((cx, responder)) => {
                let sink = resolver;
                cx.execute(Box::new(move || match catch_user(responder) {
                    Ok(acknowledgement) => adopt(&sink, &acknowledgement),
                    Err(panic_error) => sink.fail(panic_error),
                }));
            }
            None => resolver.resolve(()),
        }

        self.dispatch(pending.callbacks);
        (ack, true)
    }

    /// Attempts the `Running -> Done/Failed` transition, dispatching
    /// callbacks on success. Cancellation goes through
    /// [`cancel_with_flag`](Self::cancel_with_flag) so the responder and
    /// acknowledgement plumbing stay in one place.
    pub(crate) fn complete_with(&self, outcome: Settled<T>) -> bool {
        let outcome = match outcome {
            Settled::Cancelled => return self.cancel_with_flag().1,
            other => other,
        };

        let pending = {
            let mut inner = self.shared.inner.lock();
            match &inner.phase {
                Phase::Settled(_) => return false,
                Phase::Running(_) => {
                    let state = outcome.state();
                    let Phase::Running(pending) =
                        std::mem::replace(&mut inner.phase, Phase::Settled(outcome))
                    else {
                        unreachable!("phase changed while locked")
                    };
                    tracing::trace!(state = %state, "future settled");
                    pending
                }
            }
        };

        self.shared.completed.notify_all();
        self.dispatch(pending.callbacks);
        true
    }

    /// Installs the cancellation responder. Only the first installation
    /// on a record is wired; later attempts and installations on a
    /// terminal record are silently dropped.
    pub(crate) fn install_responder(&self, cx: Context, responder: Responder) {
        let mut inner = self.shared.inner.lock();
        if let Phase::Running(pending) = &mut inner.phase {
            if pending.responder.is_none() {
                pending.responder = Some((cx, responder));
            } else {
                tracing::debug!("cancellation responder already installed; ignoring");
            }
        }
    }

    fn dispatch(&self, callbacks: smallvec::SmallVec<[(Context, Callback<T>); 2]>) {
        for (cx, callback) in callbacks {
            tracing::trace!(context = cx.label(), "dispatching completion callback");
            let handle = self.clone();
            cx.execute(Box::new(move || callback(&handle)));
        }
    }
}

impl<T: Clone + Send + 'static> Future<T> {
    /// Blocks the calling thread until the future completes or `timeout`
    /// elapses, returning the terminal snapshot or `None` on timeout.
    #[must_use]
    pub fn wait_settled(&self, timeout: Duration) -> Option<Settled<T>> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.shared.inner.lock();
        loop {
            if let Phase::Settled(s) = &inner.phase {
                return Some(s.clone());
            }
            if self
                .shared
                .completed
                .wait_until(&mut inner, deadline)
                .timed_out()
            {
                return match &inner.phase {
                    Phase::Settled(s) => Some(s.clone()),
                    Phase::Running(_) => None,
                };
            }
        }
    }

    /// Blocks until the future completes or `timeout` elapses, folding
    /// the terminal state into a `Result`.
    pub fn wait(&self, timeout: Duration) -> Result<T, WaitError> {
        match self.wait_settled(timeout) {
            Some(settled) => settled.into_result(),
            None => Err(WaitError::Timeout { elapsed: timeout }),
        }
    }
}

/// A non-owning handle to a future's record.
///
/// Combinators hold their upstream through this so an abandoned pipeline
/// does not keep producers alive just for cancellation propagation.
pub struct WeakFuture<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for WeakFuture<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> WeakFuture<T> {
    /// Recovers a strong handle if the record is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Future<T>> {
        self.shared.upgrade().map(Future::from_shared)
    }
}

impl<T> fmt::Debug for WeakFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakFuture").finish_non_exhaustive()
    }
}

/// Mirrors `source`'s terminal state into `sink` once `source` settles.
///
/// Wired through the inline context: the mirror runs on whichever thread
/// settles `source`, before any of `source`'s externally installed
/// callbacks see a context hop.
pub(crate) fn adopt<T: Clone + Send + 'static>(sink: &ResolvableFuture<T>, source: &Future<T>) {
    let sink = sink.clone();
    source.on_completion(&inline(), move |settled| match settled.settled_now() {
        Settled::Done(v) => sink.resolve(v),
        Settled::Failed(e) => sink.fail(e),
        Settled::Cancelled => {
            let _ = sink.cancel();
        }
    });
}

/// Runs user code, converting a panic into a structured failure.
pub(crate) fn catch_user<R>(f: impl FnOnce() -> R) -> Result<R, ErrorInfo> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "user closure panicked".to_string());
        ErrorInfo::panic(message)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ManualContext;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn immediate_constructors_are_terminal() {
        let done = Future::with_value(5);
        assert_eq!(done.state(), State::Done);
        assert_eq!(done.value(), Some(5));
        assert!(done.error().is_none());

        let failed: Future<i32> = Future::with_error(ErrorInfo::msg("boom"));
        assert_eq!(failed.state(), State::Failed);
        assert!(failed.value().is_none());
        assert!(failed.error().is_some());
    }

    #[test]
    fn resolve_is_honored_once() {
        let resolvable = ResolvableFuture::new();
        let future = resolvable.future();

        resolvable.resolve(1);
        resolvable.resolve(2);
        resolvable.fail(ErrorInfo::msg("late"));
        let _ = future.cancel();

        assert_eq!(future.state(), State::Done);
        assert_eq!(future.value(), Some(1));
    }

    #[test]
    fn callbacks_fire_in_installation_order() {
        let cx = Arc::new(ManualContext::new());
        let context: Context = cx.clone();
        let resolvable = ResolvableFuture::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..4 {
            let o = Arc::clone(&order);
            resolvable
                .future()
                .on_completion(&context, move |_| o.lock().push(i));
        }

        resolvable.resolve(());
        cx.run_all();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn callback_on_completed_future_goes_through_the_context() {
        let cx = Arc::new(ManualContext::new());
        let context: Context = cx.clone();
        let future = Future::with_value(9);
        let seen = Arc::new(AtomicUsize::new(0));

        let s = Arc::clone(&seen);
        future.on_completion(&context, move |f| {
            s.store(f.value().unwrap_or(0) as usize, Ordering::SeqCst);
        });

        // Not yet: the work is queued, not run inline.
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        cx.run_all();
        assert_eq!(seen.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn each_callback_fires_exactly_once() {
        let resolvable = ResolvableFuture::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        resolvable
            .future()
            .on_completion(&inline(), move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            });

        resolvable.resolve(1);
        resolvable.resolve(2);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancel_returns_the_same_acknowledgement_handle() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();

        let first = future.cancel();
        let second = future.cancel();
        assert!(Future::ptr_eq(&first, &second));
        assert_eq!(future.state(), State::Cancelled);
    }

    #[test]
    fn cancel_on_terminal_future_resolves_immediately() {
        let future = Future::with_value(1);
        let ack = future.cancel();
        assert_eq!(ack.state(), State::Done);
        assert_eq!(future.state(), State::Done);

        // Identity still holds for later calls.
        let again = future.cancel();
        assert!(Future::ptr_eq(&ack, &again));
    }

    #[test]
    fn cancel_without_responder_acknowledges_immediately() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let ack = resolvable.future().cancel();
        assert_eq!(ack.state(), State::Done);
    }

    #[test]
    fn responder_fires_on_cancel_only() {
        let fired = Arc::new(AtomicUsize::new(0));

        // Resolving normally never invokes the responder.
        let resolvable = ResolvableFuture::new();
        let f = Arc::clone(&fired);
        resolvable.future().install_responder(
            inline(),
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
                Future::with_value(())
            }),
        );
        resolvable.resolve(1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Cancelling invokes it exactly once.
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let f = Arc::clone(&fired);
        resolvable.future().install_responder(
            inline(),
            Box::new(move || {
                f.fetch_add(1, Ordering::SeqCst);
                Future::with_value(())
            }),
        );
        let _ = resolvable.future().cancel();
        let _ = resolvable.future().cancel();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_responder_is_not_wired() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();
        let winner = Arc::new(AtomicUsize::new(0));

        let w = Arc::clone(&winner);
        future.install_responder(
            inline(),
            Box::new(move || {
                w.store(1, Ordering::SeqCst);
                Future::with_value(())
            }),
        );
        let w = Arc::clone(&winner);
        future.install_responder(
            inline(),
            Box::new(move || {
                w.store(2, Ordering::SeqCst);
                Future::with_value(())
            }),
        );

        let _ = future.cancel();
        assert_eq!(winner.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn acknowledgement_tracks_the_responder_future() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();
        let cleanup: ResolvableFuture<()> = ResolvableFuture::new();

        let cleanup_future = cleanup.future();
        future.install_responder(inline(), Box::new(move || cleanup_future));

        let ack = future.cancel();
        assert_eq!(ack.state(), State::Running);

        cleanup.resolve(());
        assert_eq!(ack.state(), State::Done);
    }

    #[test]
    fn failing_responder_fails_only_the_acknowledgement() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();

        future.install_responder(
            inline(),
            Box::new(|| Future::with_error(ErrorInfo::msg("cleanup failed"))),
        );

        let ack = future.cancel();
        assert_eq!(future.state(), State::Cancelled);
        assert_eq!(ack.state(), State::Failed);
    }

    #[test]
    fn wait_returns_the_value() {
        let resolvable = ResolvableFuture::new();
        let future = resolvable.future();

        let producer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            resolvable.resolve(42);
        });

        assert_eq!(future.wait(Duration::from_secs(2)), Ok(42));
        producer.join().expect("producer panicked");
    }

    #[test]
    fn wait_times_out_on_a_running_future() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let started = Instant::now();
        let result = resolvable.future().wait(Duration::from_millis(30));
        assert!(matches!(result, Err(WaitError::Timeout { .. })));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn wait_surfaces_failure_and_cancellation() {
        let failed: Future<i32> = Future::with_error(ErrorInfo::msg("boom"));
        assert!(matches!(
            failed.wait(Duration::from_millis(10)),
            Err(WaitError::Failed(_))
        ));

        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();
        let _ = future.cancel();
        assert_eq!(future.wait(Duration::from_millis(10)), Err(WaitError::Cancelled));
    }

    #[test]
    fn weak_handle_drops_with_the_record() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let weak = resolvable.future().downgrade();
        assert!(weak.upgrade().is_some());

        drop(resolvable);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn catch_user_converts_panics() {
        let ok = catch_user(|| 7);
        assert_eq!(ok, Ok(7));

        let err = catch_user(|| -> i32 { panic!("broke {}", 3) }).unwrap_err();
        assert_eq!(err.domain(), crate::error::PANIC_DOMAIN);
        assert_eq!(err.description(), Some("broke 3"));
    }
}
