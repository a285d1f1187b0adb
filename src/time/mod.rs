//! Deadline scheduling for the timing combinators.
//!
//! A single lazily started driver thread owns a min-heap of deadlines and
//! fires each entry's closure once its deadline passes. The closures are
//! internal plumbing (resolving a record or re-submitting work to an
//! execution context) and must stay cheap; anything heavier is bounced to
//! a context first.

pub(crate) mod driver;

pub(crate) use driver::TimerDriver;
