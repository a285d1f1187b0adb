//! The lifecycle state of a future.
//!
//! A future starts `Running` and transitions exactly once into one of the
//! terminal states. There are no transitions out of a terminal state.
//!
//! ```text
//!         resolve(value)
//! Running ──────────────► Done       (terminal)
//!    │    fail(error)
//!    ├─────────────────── Failed     (terminal)
//!    │    cancel()
//!    └─────────────────── Cancelled  (terminal)
//! ```

use core::fmt;
use serde::Serialize;

/// The observable state of a future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum State {
    /// Not yet resolved; the only non-terminal state.
    Running,
    /// Resolved with a value.
    Done,
    /// Resolved with an error.
    Failed,
    /// Cancelled before resolving.
    Cancelled,
}

impl State {
    /// Returns true for any state other than `Running`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
