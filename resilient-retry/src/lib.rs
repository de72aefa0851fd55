//! Policy objects used by `resilient-http` to drive its attempt loop.
//!
//! - [`Backoff`] maps the index of a failed attempt to the wait before the next one.
//! - [`AttemptLog`] keeps, forwards or drops an [`AttemptRecord`] per failed attempt.
//! - [`StatusPolicy`] decides whether a response status is worth another attempt.
//!
//! None of these perform I/O, so they can be unit tested and reused without a
//! network stack.
mod attempt_log;
mod backoff;
mod retryable;

pub use attempt_log::{AttemptFailure, AttemptLog, AttemptRecord, LogHook};
pub use backoff::{
    effective_wait, Backoff, Exponential, Fixed, Jittered, Linear, MIN_WAIT, WAIT_EPSILON,
};
pub use retryable::{Retryable, StatusPolicy};
