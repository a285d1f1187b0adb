//! Cancellation hooks.

use super::UpstreamLink;
use crate::exec::Context;
use crate::future::{adopt, Future, ResolvableFuture};

impl<T: Clone + Send + 'static> Future<T> {
    /// Installs `handler` as this future's cancellation responder and
    /// returns a mirror of this future.
    ///
    /// When this future transitions to `Cancelled`, `handler` runs on
    /// `cx` and its returned future settles the acknowledgement handed
    /// out by `cancel`. Only the first responder installed on a record
    /// is wired; later installations are silently dropped — though each
    /// combinator-produced future has its own responder slot.
    pub fn respond_to_cancellation<F>(&self, cx: &Context, handler: F) -> Future<T>
    where
        F: FnOnce() -> Future<()> + Send + 'static,
    {
        self.install_responder(cx.clone(), Box::new(handler));

        let downstream = ResolvableFuture::new();
        UpstreamLink::to(self).bind(&downstream);
        adopt(&downstream, self);
        downstream.future()
    }
}
