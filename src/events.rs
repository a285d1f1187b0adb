//! Event-gated futures.
//!
//! An [`EventNotifier`] turns "wait for the next event matching a
//! predicate" into a future. Producers push events with
//! [`publish`](EventNotifier::publish); consumers register a predicate
//! with [`next_event`](EventNotifier::next_event) and get back a future
//! that resolves with the first matching event published after the call.
//!
//! Waiters are examined in registration order for every arriving event.
//! One event may resolve several waiters, but each future resolves from
//! at most one event. Cancelled waiters are discarded the next time an
//! event arrives. Events published before
//! [`start_listening`](EventNotifier::start_listening) are dropped.

use crate::future::{catch_user, Future, ResolvableFuture};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

type Predicate<E> = Box<dyn Fn(&E) -> bool + Send + 'static>;

struct Waiter<E> {
    predicate: Predicate<E>,
    sink: ResolvableFuture<E>,
}

struct NotifierState<E> {
    listening: bool,
    waiters: Vec<Waiter<E>>,
}

/// Fans external events out to predicate-gated futures.
pub struct EventNotifier<E> {
    inner: Arc<Mutex<NotifierState<E>>>,
}

impl<E> Clone for EventNotifier<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for EventNotifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("EventNotifier")
            .field("listening", &state.listening)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

impl<E> Default for EventNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventNotifier<E> {
    /// Creates a notifier that is not yet listening.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(NotifierState {
                listening: false,
                waiters: Vec::new(),
            })),
        }
    }

    /// Begins observing events. Idempotent.
    pub fn start_listening(&self) {
        let mut state = self.inner.lock();
        if !state.listening {
            state.listening = true;
            tracing::debug!("event notifier listening");
        }
    }

    /// True once [`start_listening`](Self::start_listening) has been called.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.lock().listening
    }

    /// Number of registered, unresolved waiters.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.inner.lock().waiters.len()
    }
}

impl<E: Clone + Send + 'static> EventNotifier<E> {
    /// Returns a future resolving with the first event published after
    /// this call whose predicate evaluation yields true.
    ///
    /// A panicking predicate fails the future. Cancelling the future
    /// unregisters the waiter.
    pub fn next_event<P>(&self, predicate: P) -> Future<E>
    where
        P: Fn(&E) -> bool + Send + 'static,
    {
        let sink = ResolvableFuture::new();
        let future = sink.future();
        self.inner.lock().waiters.push(Waiter {
            predicate: Box::new(predicate),
            sink,
        });
        future
    }

    /// Delivers an event to the registered waiters, in registration
    /// order. Dropped when the notifier is not listening.
    pub fn publish(&self, event: E) {
        let drained = {
            let mut state = self.inner.lock();
            if !state.listening {
                tracing::trace!("event dropped: notifier not listening");
                return;
            }
            std::mem::take(&mut state.waiters)
        };

        // Predicates are user code; evaluate them outside the lock so a
        // predicate may register further waiters.
        let mut kept = Vec::new();
        for waiter in drained {
            if waiter.sink.is_completed() {
                continue;
            }
            match catch_user(|| (waiter.predicate)(&event)) {
                Ok(true) => waiter.sink.resolve(event.clone()),
                Ok(false) => kept.push(waiter),
                Err(panic_error) => waiter.sink.fail(panic_error),
            }
        }

        // Survivors keep their place ahead of waiters registered while
        // the lock was released.
        let mut state = self.inner.lock();
        let registered_meanwhile = std::mem::take(&mut state.waiters);
        kept.extend(registered_meanwhile);
        state.waiters = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::State;

    #[derive(Debug, Clone, PartialEq)]
    struct CrashEvent {
        process: &'static str,
        code: i32,
    }

    fn crashed(process: &'static str, code: i32) -> CrashEvent {
        CrashEvent { process, code }
    }

    #[test]
    fn events_before_listening_are_dropped() {
        let notifier = EventNotifier::new();
        let waiter = notifier.next_event(|_: &CrashEvent| true);

        notifier.publish(crashed("early", 1));
        assert_eq!(waiter.state(), State::Running);

        notifier.start_listening();
        notifier.publish(crashed("late", 2));
        assert_eq!(waiter.value(), Some(crashed("late", 2)));
    }

    #[test]
    fn start_listening_is_idempotent() {
        let notifier: EventNotifier<CrashEvent> = EventNotifier::new();
        notifier.start_listening();
        notifier.start_listening();
        assert!(notifier.is_listening());
    }

    #[test]
    fn non_matching_events_are_skipped() {
        let notifier = EventNotifier::new();
        notifier.start_listening();

        let waiter = notifier.next_event(|e: &CrashEvent| e.process == "target");

        notifier.publish(crashed("other", 1));
        assert_eq!(waiter.state(), State::Running);

        notifier.publish(crashed("target", 2));
        assert_eq!(waiter.value(), Some(crashed("target", 2)));
    }

    #[test]
    fn each_future_resolves_from_one_event() {
        let notifier = EventNotifier::new();
        notifier.start_listening();

        let first = notifier.next_event(|e: &CrashEvent| e.code > 0);
        notifier.publish(crashed("a", 1));
        notifier.publish(crashed("b", 2));

        assert_eq!(first.value(), Some(crashed("a", 1)));
        assert_eq!(notifier.waiting(), 0);
    }

    #[test]
    fn one_event_can_resolve_several_waiters() {
        let notifier = EventNotifier::new();
        notifier.start_listening();

        let by_name = notifier.next_event(|e: &CrashEvent| e.process == "app");
        let by_code = notifier.next_event(|e: &CrashEvent| e.code == 11);

        notifier.publish(crashed("app", 11));
        assert_eq!(by_name.value(), Some(crashed("app", 11)));
        assert_eq!(by_code.value(), Some(crashed("app", 11)));
    }

    #[test]
    fn cancelled_waiters_never_resolve() {
        let notifier = EventNotifier::new();
        notifier.start_listening();

        let waiter = notifier.next_event(|_: &CrashEvent| true);
        let _ = waiter.cancel();

        notifier.publish(crashed("app", 1));
        assert_eq!(waiter.state(), State::Cancelled);
        assert_eq!(notifier.waiting(), 0);
    }

    #[test]
    fn panicking_predicate_fails_its_waiter_only() {
        let notifier = EventNotifier::new();
        notifier.start_listening();

        let broken = notifier.next_event(|_: &CrashEvent| panic!("predicate broke"));
        let healthy = notifier.next_event(|_: &CrashEvent| true);

        notifier.publish(crashed("app", 1));
        assert_eq!(broken.state(), State::Failed);
        assert_eq!(healthy.value(), Some(crashed("app", 1)));
    }
}
