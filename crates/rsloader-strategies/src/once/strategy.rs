//! Immediate strategy implementation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rsloader_domain::{
    BatchFunction, CancellationToken, Deferred, Key, Keys, LoadError, LoadResult, ResultMap,
    Thunk, ThunkMany,
};
use tokio::task::JoinError;
use tracing::{debug, warn};

use crate::logging::{LoadLogger, TracingLogger};
use crate::strategy::{Strategy, StrategyFactory};

/// Options for the immediate strategy.
#[derive(Clone)]
pub struct OnceOptions {
    /// Run the resolver in a background task; the accessor waits for it.
    pub detached: bool,
    /// Sink for strategy notices.
    pub logger: Arc<dyn LoadLogger>,
}

impl Default for OnceOptions {
    fn default() -> Self {
        Self {
            detached: false,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl OnceOptions {
    /// Enables or disables detached execution.
    pub fn with_detached(mut self, detached: bool) -> Self {
        self.detached = detached;
        self
    }

    /// Sets the logger.
    pub fn with_logger(mut self, logger: Arc<dyn LoadLogger>) -> Self {
        self.logger = logger;
        self
    }
}

impl fmt::Debug for OnceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceOptions")
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

/// Strategy that resolves every call on its own.
pub struct OnceStrategy<K: Key, V> {
    resolver: Arc<dyn BatchFunction<K, V>>,
    options: OnceOptions,
}

impl<K, V> OnceStrategy<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new immediate strategy.
    pub fn new(resolver: Arc<dyn BatchFunction<K, V>>, options: OnceOptions) -> Self {
        Self { resolver, options }
    }

    /// Returns a factory producing immediate strategies with `options`.
    ///
    /// The capacity handed to the factory is ignored.
    pub fn factory(options: OnceOptions) -> StrategyFactory<K, V> {
        Arc::new(move |_capacity: usize, resolver: Arc<dyn BatchFunction<K, V>>| {
            Arc::new(OnceStrategy::new(resolver, options.clone())) as Arc<dyn Strategy<K, V>>
        })
    }
}

#[async_trait]
impl<K, V> Strategy<K, V> for OnceStrategy<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self, ctx: &CancellationToken, key: K) -> Thunk<V> {
        let keys = Keys::from_keys([key.clone()]);
        debug!(key = %key.key_id(), detached = self.options.detached, "resolving key");

        if !self.options.detached {
            let results = self.resolver.load(ctx, &keys).await;
            return Deferred::ready(results.get_value(&key));
        }

        let resolver = Arc::clone(&self.resolver);
        let task_ctx = ctx.clone();
        let handle = tokio::spawn(async move {
            let results = resolver.load(&task_ctx, &keys).await;
            results.get_value(&key)
        });

        let failure = TaskFailureReporter::new(self);
        Deferred::new(async move {
            match handle.await {
                Ok(result) => result,
                Err(error) => (LoadResult::err(failure.report(&error)), true),
            }
        })
    }

    async fn load_many(&self, ctx: &CancellationToken, keys: Vec<K>) -> ThunkMany<V> {
        let keys = Keys::from_keys(keys);
        debug!(keys = keys.len(), detached = self.options.detached, "resolving keys");

        if !self.options.detached {
            return Deferred::ready(self.resolver.load(ctx, &keys).await);
        }

        let resolver = Arc::clone(&self.resolver);
        let task_ctx = ctx.clone();
        let task_keys = keys.clone();
        let handle = tokio::spawn(async move { resolver.load(&task_ctx, &task_keys).await });

        let failure = TaskFailureReporter::new(self);
        Deferred::new(async move {
            match handle.await {
                Ok(results) => results,
                Err(error) => ResultMap::fail_all(&keys, failure.report(&error)),
            }
        })
    }

    async fn load_noop(&self, _ctx: &CancellationToken) {}
}

/// Owned handle for reporting a detached task failure after `load` returns.
struct TaskFailureReporter {
    logger: Arc<dyn LoadLogger>,
}

impl TaskFailureReporter {
    fn new<K: Key, V>(strategy: &OnceStrategy<K, V>) -> Self {
        Self {
            logger: Arc::clone(&strategy.options.logger),
        }
    }

    fn report(&self, error: &JoinError) -> LoadError {
        warn!(error = %error, "detached resolver task failed");
        self.logger
            .log_fmt(format_args!("resolver task failed: {error}"));
        LoadError::TaskFailed {
            message: error.to_string(),
        }
    }
}
