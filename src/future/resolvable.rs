//! The write surface of a future.

use super::{Future, Settled};
use crate::error::ErrorInfo;
use std::fmt;
use std::ops::Deref;

/// A future plus the right to resolve it.
///
/// Producers keep the resolvable side and hand out the read surface via
/// [`future`](ResolvableFuture::future). Writes after the first terminal
/// transition are silently discarded; when several producers race, at
/// most one wins and the rest are no-ops.
///
/// Derefs to [`Future`], so state queries, callback installation, and
/// `cancel` are available directly.
pub struct ResolvableFuture<T> {
    future: Future<T>,
}

impl<T> Clone for ResolvableFuture<T> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
        }
    }
}

impl<T> fmt::Debug for ResolvableFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvableFuture")
            .field("state", &self.future.state())
            .finish()
    }
}

impl<T: Send + 'static> ResolvableFuture<T> {
    /// Creates a new running future with its write surface.
    #[must_use]
    pub fn new() -> Self {
        Self {
            future: Future::new_running(),
        }
    }

    /// Returns a read handle to the same record.
    #[must_use]
    pub fn future(&self) -> Future<T> {
        self.future.clone()
    }

    /// Attempts `Running -> Done(value)`; discarded on a terminal record.
    pub fn resolve(&self, value: T) {
        let _ = self.try_resolve(value);
    }

    /// Attempts `Running -> Failed(error)`; discarded on a terminal record.
    pub fn fail(&self, error: ErrorInfo) {
        let _ = self.try_fail(error);
    }

    pub(crate) fn try_resolve(&self, value: T) -> bool {
        self.future.complete_with(Settled::Done(value))
    }

    pub(crate) fn try_fail(&self, error: ErrorInfo) -> bool {
        self.future.complete_with(Settled::Failed(error))
    }

    /// Applies a full terminal snapshot; reports whether this call won.
    pub(crate) fn try_settle(&self, outcome: Settled<T>) -> bool {
        self.future.complete_with(outcome)
    }
}

impl<T: Send + 'static> Default for ResolvableFuture<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Deref for ResolvableFuture<T> {
    type Target = Future<T>;

    fn deref(&self) -> &Future<T> {
        &self.future
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::State;

    #[test]
    fn starts_running() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        assert_eq!(resolvable.state(), State::Running);
        assert!(!resolvable.is_completed());
    }

    #[test]
    fn fail_reaches_the_read_surface() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let future = resolvable.future();

        resolvable.fail(ErrorInfo::msg("boom"));
        assert_eq!(future.state(), State::Failed);
        assert_eq!(future.error().expect("error").description(), Some("boom"));
    }

    #[test]
    fn clones_write_to_the_same_record() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        let sibling = resolvable.clone();

        sibling.resolve(3);
        assert_eq!(resolvable.future().value(), Some(3));
    }

    #[test]
    fn racing_writers_honor_one() {
        let resolvable: ResolvableFuture<i32> = ResolvableFuture::new();
        assert!(resolvable.try_resolve(1));
        assert!(!resolvable.try_fail(ErrorInfo::msg("late")));
        assert!(!resolvable.try_resolve(2));
        assert_eq!(resolvable.future().value(), Some(1));
    }
}
