//! Core types for the future state machine.
//!
//! - [`State`]: the four-valued lifecycle of a future
//! - [`Settled`]: a snapshot of a terminal state together with its payload

pub mod settled;
pub mod state;

pub use settled::Settled;
pub use state::State;
