//! The combinator algebra over futures.
//!
//! Each combinator creates a running downstream future, installs a
//! completion callback on its upstream(s) that drives the downstream,
//! and wires a cancellation responder on the downstream that propagates
//! `cancel` back to whatever is currently producing — the original
//! upstream, or the inner future once `and_then`/`chain`/`resolve_until`
//! have produced one.
//!
//! Semantic groups:
//!
//! - Transformation: [`map`](crate::Future::map),
//!   [`and_then`](crate::Future::and_then), [`chain`](crate::Future::chain),
//!   [`fallback`](crate::Future::fallback), [`replace`](crate::Future::replace)
//! - Timing: [`delay`](crate::Future::delay), [`timeout`](crate::Future::timeout),
//!   [`timeout_cancelling`](crate::Future::timeout_cancelling)
//! - Aggregation: [`join_all`], [`race`]
//! - Production: [`resolve`](crate::Future::resolve),
//!   [`resolve_value`](crate::Future::resolve_value),
//!   [`resolve_when`](crate::Future::resolve_when),
//!   [`resolve_until`](crate::Future::resolve_until)
//! - Cancellation hook:
//!   [`respond_to_cancellation`](crate::Future::respond_to_cancellation)

mod delay;
mod join;
mod poll;
mod produce;
mod race;
mod respond;
mod retry;
mod timeout;
mod transform;

pub use join::join_all;
pub use poll::PollOptions;
pub use race::race;

use crate::exec::inline;
use crate::future::{Future, ResolvableFuture, WeakFuture};
use parking_lot::Mutex;
use std::sync::Arc;

/// Something a downstream future can forward a cancel request to.
pub(crate) trait Cancellable: Send {
    fn propagate_cancel(&self) -> Future<()>;
}

impl<T: Send + 'static> Cancellable for WeakFuture<T> {
    fn propagate_cancel(&self) -> Future<()> {
        match self.upgrade() {
            Some(upstream) => upstream.cancel(),
            None => Future::with_value(()),
        }
    }
}

/// Fans a cancel request out to every input of an aggregate.
pub(crate) struct FanCancel<T>(pub(crate) Vec<WeakFuture<T>>);

impl<T: Send + 'static> Cancellable for FanCancel<T> {
    fn propagate_cancel(&self) -> Future<()> {
        for weak in &self.0 {
            if let Some(input) = weak.upgrade() {
                let _ = input.cancel();
            }
        }
        Future::with_value(())
    }
}

/// The retargetable backward edge of a pipeline stage.
///
/// Holds the current producer weakly; `bind` installs a responder on the
/// downstream future that takes the target and cancels it. Stages that
/// switch producers mid-flight (`and_then`, `chain`, `replace`,
/// `resolve_until`) call `retarget` when the inner future appears.
#[derive(Clone)]
pub(crate) struct UpstreamLink {
    target: Arc<Mutex<Option<Box<dyn Cancellable>>>>,
}

impl UpstreamLink {
    pub(crate) fn to<T: Send + 'static>(upstream: &Future<T>) -> Self {
        Self::holding(Box::new(upstream.downgrade()))
    }

    pub(crate) fn holding(target: Box<dyn Cancellable>) -> Self {
        Self {
            target: Arc::new(Mutex::new(Some(target))),
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            target: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn retarget<T: Send + 'static>(&self, upstream: &Future<T>) {
        *self.target.lock() = Some(Box::new(upstream.downgrade()));
    }

    pub(crate) fn bind<T: Send + 'static>(&self, downstream: &ResolvableFuture<T>) {
        let link = self.clone();
        downstream.future().install_responder(
            inline(),
            Box::new(move || match link.target.lock().take() {
                Some(producer) => producer.propagate_cancel(),
                None => Future::with_value(()),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::State;

    #[test]
    fn link_cancels_its_target() {
        let upstream: ResolvableFuture<i32> = ResolvableFuture::new();
        let downstream: ResolvableFuture<i32> = ResolvableFuture::new();

        UpstreamLink::to(&upstream.future()).bind(&downstream);
        let _ = downstream.future().cancel();

        assert_eq!(upstream.state(), State::Cancelled);
    }

    #[test]
    fn retarget_moves_the_backward_edge() {
        let first: ResolvableFuture<i32> = ResolvableFuture::new();
        let second: ResolvableFuture<i32> = ResolvableFuture::new();
        let downstream: ResolvableFuture<i32> = ResolvableFuture::new();

        let link = UpstreamLink::to(&first.future());
        link.bind(&downstream);
        link.retarget(&second.future());

        let _ = downstream.future().cancel();
        assert_eq!(first.state(), State::Running);
        assert_eq!(second.state(), State::Cancelled);
    }

    #[test]
    fn dead_target_acknowledges_immediately() {
        let downstream: ResolvableFuture<i32> = ResolvableFuture::new();
        {
            let upstream: ResolvableFuture<i32> = ResolvableFuture::new();
            UpstreamLink::to(&upstream.future()).bind(&downstream);
        }
        let ack = downstream.future().cancel();
        assert_eq!(ack.state(), State::Done);
    }

    #[test]
    fn fan_cancel_reaches_every_input() {
        let inputs: Vec<ResolvableFuture<i32>> =
            (0..3).map(|_| ResolvableFuture::new()).collect();
        let downstream: ResolvableFuture<i32> = ResolvableFuture::new();

        let weaks = inputs.iter().map(|r| r.future().downgrade()).collect();
        UpstreamLink::holding(Box::new(FanCancel(weaks))).bind(&downstream);

        let _ = downstream.future().cancel();
        for input in &inputs {
            assert_eq!(input.state(), State::Cancelled);
        }
    }
}
