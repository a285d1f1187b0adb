//! Terminal-state snapshot of a future.
//!
//! [`Settled`] captures the payload of a future that has left `Running`:
//!
//! - `Done(T)`: success with a value
//! - `Failed(ErrorInfo)`: structured failure
//! - `Cancelled`: cancelled before resolving
//!
//! Combinators operate on these snapshots; a snapshot is immutable once
//! taken, mirroring the monotonicity of the underlying record.

use crate::error::{ErrorInfo, WaitError};
use crate::types::State;

/// The terminal payload of a future.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// Resolved with a value.
    Done(T),
    /// Resolved with a structured error.
    Failed(ErrorInfo),
    /// Cancelled before resolving.
    Cancelled,
}

impl<T> Settled<T> {
    /// Returns the corresponding [`State`].
    #[must_use]
    pub const fn state(&self) -> State {
        match self {
            Self::Done(_) => State::Done,
            Self::Failed(_) => State::Failed,
            Self::Cancelled => State::Cancelled,
        }
    }

    /// Returns true if this snapshot is `Done`.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Returns true if this snapshot is `Failed`.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns true if this snapshot is `Cancelled`.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the success value, consuming the snapshot.
    pub fn value(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error, consuming the snapshot.
    pub fn error(self) -> Option<ErrorInfo> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the success value, passing the other variants through.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Settled<U> {
        match self {
            Self::Done(v) => Settled::Done(f(v)),
            Self::Failed(e) => Settled::Failed(e),
            Self::Cancelled => Settled::Cancelled,
        }
    }

    /// Converts to a `Result`, folding failure and cancellation into
    /// [`WaitError`].
    pub fn into_result(self) -> Result<T, WaitError> {
        match self {
            Self::Done(v) => Ok(v),
            Self::Failed(e) => Err(WaitError::Failed(e)),
            Self::Cancelled => Err(WaitError::Cancelled),
        }
    }
}

impl<T> From<Result<T, ErrorInfo>> for Settled<T> {
    fn from(result: Result<T, ErrorInfo>) -> Self {
        match result {
            Ok(v) => Self::Done(v),
            Err(e) => Self::Failed(e),
        }
    }
}
