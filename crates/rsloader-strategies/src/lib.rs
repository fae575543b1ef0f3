//! rsloader-strategies: Call-coalescing strategies for batch loading
//!
//! This crate turns many independent "load this key" calls into batched
//! resolver invocations:
//! - Immediate (`once`) strategy: every call is its own batch
//! - Windowed (`standard`) strategy: calls are collected until a call count
//!   or a timeout is reached, then resolved together
//! - `DataLoader` entry point that forwards to a selected strategy
//! - Logging and configuration
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             rsloader-strategies              │
//! ├─────────────────────────────────────────────┤
//! │  strategy.rs - Strategy trait & factory     │
//! │  counter.rs  - Window call counter          │
//! │  once/       - Immediate strategy           │
//! │  standard/   - Windowed strategy            │
//! │  loader.rs   - DataLoader entry point       │
//! │  config.rs   - Settings (file + env)        │
//! │  logging.rs  - Logger collaborator          │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod counter;
pub mod loader;
pub mod logging;
pub mod once;
pub mod standard;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use config::{ConfigLoadError, LoaderSettings};
pub use counter::Counter;
pub use loader::{strategy_factory, DataLoader};
pub use logging::{LoadLogger, TracingLogger};
pub use once::{OnceOptions, OnceStrategy};
pub use standard::{StandardOptions, StandardStrategy};
pub use strategy::{Strategy, StrategyFactory};
