//! The resolver contract strategies batch calls against.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::key::{Key, Keys};
use crate::result::ResultMap;

/// A user-supplied function that resolves a set of keys in one call.
///
/// Implementations may be slow, may fail per key (reported through the
/// error slot of each [`LoadResult`](crate::LoadResult)), and may leave keys
/// out of the returned map entirely. They must accept fewer keys than the
/// strategy's capacity, including none at all, and must not assume they are
/// invoked only once per key.
#[async_trait]
pub trait BatchFunction<K: Key, V>: Send + Sync {
    /// Resolves `keys`, returning whatever results are available.
    async fn load(&self, ctx: &CancellationToken, keys: &Keys<K>) -> ResultMap<V>;
}

/// Adapts an async closure into a [`BatchFunction`].
pub struct BatchFn<F> {
    func: F,
}

impl<F> BatchFn<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<K, V, F, Fut> BatchFunction<K, V> for BatchFn<F>
where
    K: Key,
    V: Send + 'static,
    F: Fn(CancellationToken, Keys<K>) -> Fut + Send + Sync,
    Fut: Future<Output = ResultMap<V>> + Send,
{
    async fn load(&self, ctx: &CancellationToken, keys: &Keys<K>) -> ResultMap<V> {
        (self.func)(ctx.clone(), keys.clone()).await
    }
}

/// Wraps an async closure as a shareable resolver.
///
/// ```ignore
/// let resolver = batch_fn(|_ctx, keys: Keys<u64>| async move {
///     let mut map = ResultMap::new();
///     for key in &keys {
///         map.set(key, LoadResult::ok(key * 10));
///     }
///     map
/// });
/// ```
pub fn batch_fn<K, V, F, Fut>(func: F) -> Arc<dyn BatchFunction<K, V>>
where
    K: Key,
    V: Send + 'static,
    F: Fn(CancellationToken, Keys<K>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResultMap<V>> + Send + 'static,
{
    Arc::new(BatchFn::new(func))
}
