//! Deferred mirroring of a terminal state.

use super::UpstreamLink;
use crate::exec::{inline, Context};
use crate::future::{Future, ResolvableFuture};
use crate::time::TimerDriver;
use std::time::Duration;

impl<T: Clone + Send + 'static> Future<T> {
    /// Mirrors this future's terminal state at least `duration` after it
    /// completes, dispatched on `cx`.
    pub fn delay(&self, cx: &Context, duration: Duration) -> Future<T> {
        let downstream = ResolvableFuture::new();
        UpstreamLink::to(self).bind(&downstream);

        let out = downstream.clone();
        let fire_cx = cx.clone();
        self.on_completion(&inline(), move |upstream| {
            let outcome = upstream.settled_now();
            TimerDriver::global().schedule(duration, move || {
                fire_cx.execute(Box::new(move || {
                    let _ = out.try_settle(outcome);
                }));
            });
        });
        downstream.future()
    }
}
