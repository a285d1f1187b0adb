//! Deadlines over futures.
//!
//! Two variants are exposed. `timeout` only fails the downstream future
//! when the deadline passes and leaves the upstream running — callers
//! that want the producer stopped chain a cancel themselves.
//! `timeout_cancelling` also cancels the upstream when the deadline
//! fires. Both forward an explicit cancel of the downstream future to
//! the upstream.

use super::UpstreamLink;
use crate::error::ErrorInfo;
use crate::exec::Context;
use crate::future::{Future, ResolvableFuture};
use crate::time::TimerDriver;
use std::time::Duration;

impl<T: Clone + Send + 'static> Future<T> {
    /// Mirrors this future if it completes within `duration`; fails with
    /// a timeout error carrying `description` otherwise. The upstream is
    /// left running when the deadline fires.
    pub fn timeout(&self, cx: &Context, duration: Duration, description: &str) -> Future<T> {
        self.deadline(cx, duration, description, false)
    }

    /// Like [`timeout`](Self::timeout), but also cancels the upstream
    /// when the deadline fires.
    pub fn timeout_cancelling(
        &self,
        cx: &Context,
        duration: Duration,
        description: &str,
    ) -> Future<T> {
        self.deadline(cx, duration, description, true)
    }

    fn deadline(
        &self,
        cx: &Context,
        duration: Duration,
        description: &str,
        cancel_upstream: bool,
    ) -> Future<T> {
        let downstream = ResolvableFuture::new();
        UpstreamLink::to(self).bind(&downstream);

        let out = downstream.clone();
        self.on_completion(cx, move |upstream| {
            let _ = out.try_settle(upstream.settled_now());
        });

        let out = downstream.clone();
        let description = description.to_string();
        let upstream = cancel_upstream.then(|| self.downgrade());
        TimerDriver::global().schedule(duration, move || {
            if out.try_fail(ErrorInfo::timeout(&description, duration)) {
                tracing::debug!(description = %description, "deadline fired");
                if let Some(weak) = upstream {
                    if let Some(producer) = weak.upgrade() {
                        let _ = producer.cancel();
                    }
                }
            }
        });

        downstream.future()
    }
}
