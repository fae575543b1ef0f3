//! rsloader-domain: Value types and collaborator contracts for batch loading
//!
//! This crate contains everything a batching strategy consumes but does not
//! coordinate:
//! - Identifier trait and the ordered, duplicate-free identifier set
//! - Per-key results, the missing sentinel and the result map
//! - The resolver (batch function) contract
//! - The memoized deferred accessor returned to callers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               rsloader-domain                │
//! ├─────────────────────────────────────────────┤
//! │  key.rs      - Key trait & Keys set         │
//! │  result.rs   - LoadResult & ResultMap       │
//! │  resolver.rs - BatchFunction contract       │
//! │  thunk.rs    - Deferred accessors           │
//! │  error.rs    - Per-key error types          │
//! └─────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod key;
pub mod resolver;
pub mod result;
pub mod thunk;

#[cfg(test)]
mod key_proptest;

// Re-export commonly used types at the crate root
pub use error::LoadError;
pub use key::{Key, Keys, StringKey};
pub use resolver::{batch_fn, BatchFn, BatchFunction};
pub use result::{LoadResult, Outcome, ResultMap};
pub use thunk::{Deferred, Thunk, ThunkMany};

/// Execution context handed to every load call and to the resolver.
///
/// Only cancellation is observed by this crate family.
pub use tokio_util::sync::CancellationToken;
