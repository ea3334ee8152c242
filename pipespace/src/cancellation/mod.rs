//! Cooperative cancellation.
//!
//! Cancellable flows thread a [`CancellationToken`] through every step call.
//! The engine never inspects it.

mod token;

pub use token::{CancelCallback, CancellationToken};
