//! Retry, backoff and deadline handling for proxied RPCs.
//!
//! Classification (what a stub result means for the call) lives in
//! `classify`; how long to wait before the next attempt lives in `policy`;
//! `deadline` bounds the whole loop. All waiting goes through a [`Clock`] so
//! the full retry schedule can be driven without real delays.

mod classify;
mod clock;
mod deadline;
mod policy;

pub use classify::{classify_outcome, RpcOutcome};
pub use clock::{Clock, SystemClock};
pub use deadline::Deadline;
pub use policy::{RetryDecision, RetryPolicy};
