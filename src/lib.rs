//! Settle: single-resolution futures with a cancel-correct combinator
//! algebra.
//!
//! # Overview
//!
//! A [`Future`] is the eventual outcome of a computation: it resolves
//! exactly once into `Done`, `Failed`, or `Cancelled`, and never leaves
//! that state. Producers write through [`ResolvableFuture`]; consumers
//! observe through state queries, callbacks, or a blocking wait.
//! Combinators compose futures into pipelines and aggregates with
//! precisely defined completion and cancellation semantics.
//!
//! # Core Guarantees
//!
//! - **Single resolution**: of any number of racing resolve/cancel
//!   attempts, exactly one wins; the rest are silent no-ops
//! - **Fire-once callbacks, in order**: every installed callback runs
//!   exactly once, and callbacks installed before completion run in
//!   installation order
//! - **Cancellation is a protocol**: `cancel` fires the record's
//!   responder, hands back an acknowledgement future, and propagates
//!   backward through combinators to whatever is currently producing
//! - **No inline surprises**: callbacks are dispatched on caller-chosen
//!   [execution contexts](exec), never under the record's lock
//!
//! # Module Structure
//!
//! - [`types`]: the state machine's vocabulary ([`State`], [`Settled`])
//! - [`error`]: structured errors ([`ErrorInfo`], [`WaitError`])
//! - [`exec`]: execution contexts (inline, serial, pool, manual)
//! - [`future`]: the record, read handle, and write handle
//! - [`combinator`]: transformation, timing, aggregation, production
//! - [`events`]: predicate-gated futures over external events
//! - [`test_utils`]: logging init and assertion helpers for tests
//!
//! # Example
//!
//! ```
//! use settle::{inline, Future, ResolvableFuture};
//! use std::time::Duration;
//!
//! let producer: ResolvableFuture<i32> = ResolvableFuture::new();
//! let doubled = producer.future().map(&inline(), |v| v * 2);
//!
//! producer.resolve(21);
//! assert_eq!(doubled.wait(Duration::from_secs(1)), Ok(42));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod combinator;
pub mod error;
pub mod events;
pub mod exec;
pub mod future;
pub mod test_utils;
pub mod types;

mod time;

pub use combinator::{join_all, race, PollOptions};
pub use error::{ErrorInfo, WaitError};
pub use events::EventNotifier;
pub use exec::{inline, pool, pool_with, serial, Context, ExecutionContext, ManualContext, PoolOptions, Work};
pub use future::{Future, ResolvableFuture, WeakFuture};
pub use types::{Settled, State};
