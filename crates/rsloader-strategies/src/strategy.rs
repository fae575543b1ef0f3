//! The contract shared by every batching strategy.

use std::sync::Arc;

use async_trait::async_trait;
use rsloader_domain::{BatchFunction, CancellationToken, Key, Thunk, ThunkMany};

/// A policy for coalescing load calls into resolver invocations.
///
/// Load calls only enqueue work; the returned accessor is where callers wait.
/// This lets a single task register every call of a window before reading
/// any result.
#[async_trait]
pub trait Strategy<K: Key, V: Clone>: Send + Sync {
    /// Registers `key` and returns an accessor for its result.
    async fn load(&self, ctx: &CancellationToken, key: K) -> Thunk<V>;

    /// Registers `keys` as one call and returns an accessor for their results.
    async fn load_many(&self, ctx: &CancellationToken, keys: Vec<K>) -> ThunkMany<V>;

    /// Registers a call that contributes no keys and expects no result.
    async fn load_noop(&self, ctx: &CancellationToken);
}

/// Builds a strategy for an expected number of calls and a resolver.
///
/// Options are bound when the factory is created; capacity and resolver are
/// supplied per batching cycle, so every cycle gets a fresh strategy.
pub type StrategyFactory<K, V> =
    Arc<dyn Fn(usize, Arc<dyn BatchFunction<K, V>>) -> Arc<dyn Strategy<K, V>> + Send + Sync>;
