//! Immediate ("once") strategy: every call is its own batch.
//!
//! There is no batching window. Each `load`/`load_many` call invokes the
//! resolver with exactly the keys given to that call, either inline before
//! the call returns, or in a detached background task whose result the
//! accessor waits for. Call counts are not tracked, so `load_noop` does
//! nothing.

mod strategy;

pub use strategy::{OnceOptions, OnceStrategy};
