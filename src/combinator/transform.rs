//! Value and pipeline transformation combinators.

use super::UpstreamLink;
use crate::exec::Context;
use crate::future::{adopt, catch_user, Future, ResolvableFuture};
use crate::types::Settled;

impl<T: Clone + Send + 'static> Future<T> {
    /// Transforms the success value with `f` on `cx`.
    ///
    /// Failure and cancellation pass through untouched; `f` is only
    /// called for `Done`. A panic in `f` fails the returned future.
    pub fn map<U, F>(&self, cx: &Context, f: F) -> Future<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        UpstreamLink::to(self).bind(&downstream);

        let out = downstream.clone();
        self.on_completion(cx, move |upstream| match upstream.settled_now() {
            Settled::Done(value) => match catch_user(move || f(value)) {
                Ok(mapped) => out.resolve(mapped),
                Err(panic_error) => out.fail(panic_error),
            },
            Settled::Failed(error) => out.fail(error),
            Settled::Cancelled => {
                let _ = out.cancel();
            }
        });
        downstream.future()
    }

    /// Monadic bind over success: on `Done`, `f` produces an inner
    /// future whose terminal state the result adopts. Failure and
    /// cancellation pass through without calling `f`.
    ///
    /// Once the inner future exists, a cancel of the returned future is
    /// forwarded to it instead of the (already settled) upstream.
    pub fn and_then<U, F>(&self, cx: &Context, f: F) -> Future<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Future<U> + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        let link = UpstreamLink::to(self);
        link.bind(&downstream);

        let out = downstream.clone();
        self.on_completion(cx, move |upstream| match upstream.settled_now() {
            Settled::Done(value) => match catch_user(move || f(value)) {
                Ok(inner) => {
                    link.retarget(&inner);
                    adopt(&out, &inner);
                    if out.is_completed() {
                        let _ = inner.cancel();
                    }
                }
                Err(panic_error) => out.fail(panic_error),
            },
            Settled::Failed(error) => out.fail(error),
            Settled::Cancelled => {
                let _ = out.cancel();
            }
        });
        downstream.future()
    }

    /// Bind over any non-cancelled terminal state: `g` receives the
    /// upstream snapshot — `Done` or `Failed` — and may translate either
    /// into any future it likes. On a cancelled upstream `g` is not
    /// called and the result is cancelled.
    pub fn chain<U, G>(&self, cx: &Context, g: G) -> Future<U>
    where
        U: Clone + Send + 'static,
        G: FnOnce(Settled<T>) -> Future<U> + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        let link = UpstreamLink::to(self);
        link.bind(&downstream);

        let out = downstream.clone();
        self.on_completion(cx, move |upstream| match upstream.settled_now() {
            Settled::Cancelled => {
                let _ = out.cancel();
            }
            snapshot => match catch_user(move || g(snapshot)) {
                Ok(inner) => {
                    link.retarget(&inner);
                    adopt(&out, &inner);
                    if out.is_completed() {
                        let _ = inner.cancel();
                    }
                }
                Err(panic_error) => out.fail(panic_error),
            },
        });
        downstream.future()
    }

    /// Replaces failure with `replacement`; `Done` and `Cancelled`
    /// mirror the upstream.
    pub fn fallback(&self, cx: &Context, replacement: T) -> Future<T> {
        let downstream = ResolvableFuture::new();
        UpstreamLink::to(self).bind(&downstream);

        let out = downstream.clone();
        self.on_completion(cx, move |upstream| match upstream.settled_now() {
            Settled::Done(value) => out.resolve(value),
            Settled::Failed(_) => out.resolve(replacement),
            Settled::Cancelled => {
                let _ = out.cancel();
            }
        });
        downstream.future()
    }

    /// On success, adopts the terminal state of `other` — which may
    /// still be running at that point. Failure and cancellation mirror
    /// the upstream and `other` is left untouched.
    pub fn replace<U>(&self, cx: &Context, other: &Future<U>) -> Future<U>
    where
        U: Clone + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        let link = UpstreamLink::to(self);
        link.bind(&downstream);

        let out = downstream.clone();
        let other = other.clone();
        self.on_completion(cx, move |upstream| match upstream.settled_now() {
            Settled::Done(_) => {
                link.retarget(&other);
                adopt(&out, &other);
                if out.is_completed() {
                    let _ = other.cancel();
                }
            }
            Settled::Failed(error) => out.fail(error),
            Settled::Cancelled => {
                let _ = out.cancel();
            }
        });
        downstream.future()
    }
}
