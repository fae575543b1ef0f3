//! Windowed strategy: one resolver invocation per window of calls.
//!
//! The first call of a window launches a background worker. Every call
//! hands its keys to that worker over a bounded queue and receives an
//! accessor that waits for the window to close. The window closes when:
//!
//! 1. **Capacity**: the configured number of calls has been received
//! 2. **Timeout**: the deadline armed at worker start elapses first
//! 3. **Cancellation**: the launching call's context is cancelled, in which
//!    case the resolver is never invoked
//!
//! Closing publishes the shared result map to every waiting accessor. Keys
//! the resolver left out of that map are resolved individually; keys it
//! marked missing are not.

mod strategy;
mod types;
mod worker;

pub use strategy::StandardStrategy;
pub use types::{StandardOptions, WorkerStatus, DEFAULT_TIMEOUT};

#[cfg(test)]
mod tests;
