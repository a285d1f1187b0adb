//! The shared state record behind every future handle.
//!
//! One record holds the phase (running or settled), the ordered callback
//! list, the optional cancellation responder, and the lazily created
//! cancellation future. All transitions follow the same discipline:
//! snapshot under the mutex, flip the phase, release, then dispatch
//! outside the lock. User code never runs while the record is locked —
//! callbacks may install further callbacks on this same record.

use crate::error::ErrorInfo;
use crate::exec::Context;
use crate::types::{Settled, State};
use parking_lot::{Condvar, Mutex};
use smallvec::SmallVec;
use std::sync::Arc;

use super::Future;

/// A completion callback, invoked with the settled future.
pub(crate) type Callback<T> = Box<dyn FnOnce(&Future<T>) + Send + 'static>;

/// A cancellation responder; its returned future acknowledges cleanup.
pub(crate) type Responder = Box<dyn FnOnce() -> Future<()> + Send + 'static>;

pub(crate) struct Shared<T> {
    pub(crate) inner: Mutex<Inner<T>>,
    /// Signalled on every terminal transition, for the blocking wait.
    pub(crate) completed: Condvar,
}

pub(crate) struct Inner<T> {
    pub(crate) phase: Phase<T>,
    /// Created by the first `cancel` call and handed back unchanged by
    /// every later one, whatever the phase was at that point.
    pub(crate) cancel_future: Option<Future<()>>,
}

pub(crate) enum Phase<T> {
    Running(Pending<T>),
    Settled(Settled<T>),
}

/// Everything that only exists while the record is running.
///
/// Dropped wholesale on the terminal transition, which is what releases
/// upstream references held by combinator callbacks and responders.
pub(crate) struct Pending<T> {
    pub(crate) callbacks: SmallVec<[(Context, Callback<T>); 2]>,
    pub(crate) responder: Option<(Context, Responder)>,
}

impl<T> Pending<T> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: SmallVec::new(),
            responder: None,
        }
    }
}

impl<T> Shared<T> {
    pub(crate) fn new_running() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                phase: Phase::Running(Pending::new()),
                cancel_future: None,
            }),
            completed: Condvar::new(),
        })
    }

    pub(crate) fn new_settled(outcome: Settled<T>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                phase: Phase::Settled(outcome),
                cancel_future: None,
            }),
            completed: Condvar::new(),
        })
    }

    pub(crate) fn state(&self) -> State {
        match &self.inner.lock().phase {
            Phase::Running(_) => State::Running,
            Phase::Settled(s) => s.state(),
        }
    }

    pub(crate) fn error(&self) -> Option<ErrorInfo> {
        match &self.inner.lock().phase {
            Phase::Settled(Settled::Failed(e)) => Some(e.clone()),
            _ => None,
        }
    }
}
