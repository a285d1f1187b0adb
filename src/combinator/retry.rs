//! Retrying production until success.

use super::UpstreamLink;
use crate::exec::{inline, Context};
use crate::future::{catch_user, Future, ResolvableFuture};
use crate::types::Settled;

impl<T: Clone + Send + 'static> Future<T> {
    /// Invokes `producer` on `cx` until an attempt resolves.
    ///
    /// A failed attempt starts a fresh one. A resolved attempt is
    /// mirrored and stops the loop. A cancelled attempt cancels the
    /// returned future and the producer is not called again; likewise,
    /// cancelling the returned future cancels the in-flight attempt and
    /// ends the loop.
    pub fn resolve_until<F>(cx: &Context, producer: F) -> Future<T>
    where
        F: Fn() -> Future<T> + Send + 'static,
    {
        let downstream = ResolvableFuture::new();
        let link = UpstreamLink::empty();
        link.bind(&downstream);

        run_attempt(cx.clone(), producer, downstream.clone(), link);
        downstream.future()
    }
}

fn run_attempt<T, F>(cx: Context, producer: F, out: ResolvableFuture<T>, link: UpstreamLink)
where
    T: Clone + Send + 'static,
    F: Fn() -> Future<T> + Send + 'static,
{
    let next_cx = cx.clone();
    cx.execute(Box::new(move || {
        if out.is_completed() {
            return;
        }
        let attempt = match catch_user(|| producer()) {
            Ok(attempt) => attempt,
            Err(panic_error) => {
                out.fail(panic_error);
                return;
            }
        };
        link.retarget(&attempt);

        let next_link = link.clone();
        let sink = out.clone();
        attempt.on_completion(&inline(), move |attempt| match attempt.settled_now() {
            Settled::Done(value) => sink.resolve(value),
            Settled::Failed(error) => {
                tracing::debug!(error = %error, "attempt failed; retrying");
                run_attempt(next_cx, producer, sink, next_link);
            }
            Settled::Cancelled => {
                let _ = sink.cancel();
            }
        });
    }));
}
