//! The inline execution context.

use super::{Context, ExecutionContext, Work};
use std::sync::{Arc, OnceLock};

/// Runs work immediately on the submitting thread.
#[derive(Debug)]
struct InlineContext;

impl ExecutionContext for InlineContext {
    fn execute(&self, work: Work) {
        work();
    }

    fn label(&self) -> &str {
        "inline"
    }
}

/// Returns the shared inline context.
///
/// Work submitted here runs on the calling thread before `execute`
/// returns. Callbacks registered through it therefore run on whichever
/// thread resolves the future; use it only where that reentrancy is
/// acceptable.
#[must_use]
pub fn inline() -> Context {
    static INLINE: OnceLock<Context> = OnceLock::new();
    INLINE.get_or_init(|| Arc::new(InlineContext)).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn runs_on_the_calling_thread() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        inline().execute(Box::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn shared_handle_is_cached() {
        assert!(Arc::ptr_eq(&inline(), &inline()));
    }
}
