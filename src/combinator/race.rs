//! Aggregate completion: first terminal state wins.

use super::{FanCancel, UpstreamLink};
use crate::error::ErrorInfo;
use crate::exec::Context;
use crate::future::{Future, ResolvableFuture};
use std::sync::Arc;

/// Resolves with the first input to reach a terminal state — whatever
/// that state is — and cancels all other inputs.
///
/// Inputs already terminal when the race is built are examined left to
/// right and the leftmost one wins synchronously. Racing an empty list
/// fails with an invalid-input error.
pub fn race<T>(cx: &Context, futures: Vec<Future<T>>) -> Future<T>
where
    T: Clone + Send + 'static,
{
    if futures.is_empty() {
        return Future::with_error(ErrorInfo::invalid("cannot race an empty list"));
    }

    let downstream: ResolvableFuture<T> = ResolvableFuture::new();
    let weaks = futures.iter().map(Future::downgrade).collect();
    UpstreamLink::holding(Box::new(FanCancel(weaks))).bind(&downstream);

    // Leftmost already-terminal input wins before any callback lands.
    let settled_input = futures
        .iter()
        .enumerate()
        .find_map(|(index, future)| future.settled().map(|snapshot| (index, snapshot)));
    if let Some((winner, snapshot)) = settled_input {
        tracing::trace!(winner, "race decided synchronously");
        let _ = downstream.try_settle(snapshot);
        cancel_losers(&futures, winner);
        return downstream.future();
    }

    let entrants = Arc::new(futures);
    for index in 0..entrants.len() {
        let out = downstream.clone();
        let rivals = Arc::clone(&entrants);
        entrants[index].on_completion(cx, move |input| {
            if out.try_settle(input.settled_now()) {
                tracing::trace!(winner = index, "race decided");
                cancel_losers(&rivals, index);
            }
        });
    }

    downstream.future()
}

fn cancel_losers<T: Send + 'static>(futures: &[Future<T>], winner: usize) {
    for (index, future) in futures.iter().enumerate() {
        if index != winner {
            let _ = future.cancel();
        }
    }
}
