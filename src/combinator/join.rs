//! Aggregate completion: wait for every input.

use super::{FanCancel, UpstreamLink};
use crate::exec::Context;
use crate::future::{Future, ResolvableFuture};
use crate::types::Settled;
use parking_lot::Mutex;
use std::sync::Arc;

struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

/// Resolves with every input's value, in input order, once all inputs
/// resolve.
///
/// The first failing input fails the result immediately; the remaining
/// inputs are left running. Any cancelled input cancels the result. An
/// empty list resolves immediately with an empty vector. Cancelling the
/// result cancels every input.
pub fn join_all<T>(cx: &Context, futures: Vec<Future<T>>) -> Future<Vec<T>>
where
    T: Clone + Send + 'static,
{
    if futures.is_empty() {
        return Future::with_value(Vec::new());
    }

    let downstream: ResolvableFuture<Vec<T>> = ResolvableFuture::new();
    let weaks = futures.iter().map(Future::downgrade).collect();
    UpstreamLink::holding(Box::new(FanCancel(weaks))).bind(&downstream);

    let count = futures.len();
    let gather = Arc::new(Mutex::new(Gather {
        slots: (0..count).map(|_| None).collect(),
        remaining: count,
    }));

    for (index, future) in futures.iter().enumerate() {
        let out = downstream.clone();
        let gather = Arc::clone(&gather);
        future.on_completion(cx, move |input| match input.settled_now() {
            Settled::Done(value) => {
                let complete = {
                    let mut gather = gather.lock();
                    gather.slots[index] = Some(value);
                    gather.remaining -= 1;
                    (gather.remaining == 0).then(|| {
                        gather
                            .slots
                            .iter_mut()
                            .map(|slot| slot.take().expect("input resolved without a value"))
                            .collect::<Vec<_>>()
                    })
                };
                if let Some(values) = complete {
                    out.resolve(values);
                }
            }
            Settled::Failed(error) => out.fail(error),
            Settled::Cancelled => {
                let _ = out.cancel();
            }
        });
    }

    downstream.future()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorInfo;
    use crate::exec::inline;
    use crate::types::State;

    #[test]
    fn empty_input_resolves_immediately() {
        let joined: Future<Vec<i32>> = join_all(&inline(), Vec::new());
        assert_eq!(joined.value(), Some(Vec::new()));
    }

    #[test]
    fn values_arrive_in_input_order() {
        let inputs: Vec<ResolvableFuture<i32>> =
            (0..3).map(|_| ResolvableFuture::new()).collect();
        let joined = join_all(&inline(), inputs.iter().map(|r| r.future()).collect());

        // Resolve out of order; the result still follows input order.
        inputs[2].resolve(30);
        inputs[0].resolve(10);
        assert_eq!(joined.state(), State::Running);
        inputs[1].resolve(20);

        assert_eq!(joined.value(), Some(vec![10, 20, 30]));
    }

    #[test]
    fn first_failure_short_circuits_without_cancelling_siblings() {
        let inputs: Vec<ResolvableFuture<i32>> =
            (0..3).map(|_| ResolvableFuture::new()).collect();
        let joined = join_all(&inline(), inputs.iter().map(|r| r.future()).collect());

        inputs[1].fail(ErrorInfo::msg("middle failed"));

        assert_eq!(joined.state(), State::Failed);
        assert_eq!(inputs[0].state(), State::Running);
        assert_eq!(inputs[2].state(), State::Running);
    }

    #[test]
    fn cancelled_input_cancels_the_result() {
        let inputs: Vec<ResolvableFuture<i32>> =
            (0..2).map(|_| ResolvableFuture::new()).collect();
        let joined = join_all(&inline(), inputs.iter().map(|r| r.future()).collect());

        let _ = inputs[0].future().cancel();
        assert_eq!(joined.state(), State::Cancelled);
    }

    #[test]
    fn cancelling_the_result_cancels_every_input() {
        let inputs: Vec<ResolvableFuture<i32>> =
            (0..3).map(|_| ResolvableFuture::new()).collect();
        let joined = join_all(&inline(), inputs.iter().map(|r| r.future()).collect());

        let _ = joined.cancel();
        for input in &inputs {
            assert_eq!(input.state(), State::Cancelled);
        }
    }

    #[test]
    fn mixed_payloads_via_json_values() {
        let inputs: Vec<ResolvableFuture<serde_json::Value>> =
            (0..3).map(|_| ResolvableFuture::new()).collect();
        let joined = join_all(&inline(), inputs.iter().map(|r| r.future()).collect());

        inputs[0].resolve(serde_json::Value::from(1));
        inputs[1].resolve(serde_json::Value::Bool(false));
        inputs[2].resolve(serde_json::Value::from(10));

        assert_eq!(
            joined.value(),
            Some(vec![
                serde_json::Value::from(1),
                serde_json::Value::Bool(false),
                serde_json::Value::from(10),
            ])
        );
    }
}
