//! Producer-driven construction.

use super::UpstreamLink;
use crate::error::ErrorInfo;
use crate::exec::Context;
use crate::future::{adopt, catch_user, Future, ResolvableFuture};

impl<T: Clone + Send + 'static> Future<T> {
    /// Runs `producer` on `cx`; the returned future adopts the terminal
    /// state of the future the producer builds.
    ///
    /// Cancelling the returned future before the producer has run lets
    /// the producer run anyway and cancels its future on arrival;
    /// afterwards the cancel is forwarded to the producer's future.
    pub fn resolve<F>(cx: &Context, producer: F) -> Future<T>
    where
        F: FnOnce() -> Future<T> + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        let link = UpstreamLink::empty();
        link.bind(&downstream);

        let out = downstream.clone();
        cx.execute(Box::new(move || match catch_user(producer) {
            Ok(inner) => {
                link.retarget(&inner);
                adopt(&out, &inner);
                if out.is_completed() {
                    let _ = inner.cancel();
                }
            }
            Err(panic_error) => out.fail(panic_error),
        }));

        downstream.future()
    }
}

impl<T: Send + 'static> Future<T> {
    /// Runs `producer` on `cx` and resolves or fails with its result.
    pub fn resolve_value<F>(cx: &Context, producer: F) -> Future<T>
    where
        F: FnOnce() -> Result<T, ErrorInfo> + Send + 'static,
    {
        let downstream = ResolvableFuture::new();

        let out = downstream.clone();
        cx.execute(Box::new(move || match catch_user(producer) {
            Ok(Ok(value)) => out.resolve(value),
            Ok(Err(error)) | Err(error) => out.fail(error),
        }));

        downstream.future()
    }
}
