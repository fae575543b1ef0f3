//! DataLoader entry point.
//!
//! A `DataLoader` binds a strategy to one batching cycle: the expected
//! number of calls and the resolver that serves them. Callers use it in place
//! of calling the resolver directly.
//!
//! # Example
//!
//! ```ignore
//! let settings = LoaderSettings::load("loader.yaml")?;
//! let loader = DataLoader::from_settings(&settings, 3, resolver);
//!
//! let a = loader.load(&ctx, 1).await;
//! let b = loader.load(&ctx, 2).await;
//! let c = loader.load(&ctx, 3).await;
//! let (value, found) = a.get().await;
//! ```

use std::sync::Arc;

use rsloader_domain::{BatchFunction, CancellationToken, Key, Thunk, ThunkMany};

use crate::config::{LoaderSettings, StrategyKind};
use crate::once::OnceStrategy;
use crate::standard::StandardStrategy;
use crate::strategy::{Strategy, StrategyFactory};

/// Forwards load calls to the strategy chosen for this cycle.
#[derive(Clone)]
pub struct DataLoader<K: Key, V: Clone> {
    strategy: Arc<dyn Strategy<K, V>>,
}

impl<K, V> DataLoader<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a loader for `capacity` expected calls using `factory`.
    pub fn new(
        capacity: usize,
        resolver: Arc<dyn BatchFunction<K, V>>,
        factory: &StrategyFactory<K, V>,
    ) -> Self {
        Self {
            strategy: factory(capacity, resolver),
        }
    }

    /// Creates a loader with the strategy and options named in `settings`.
    pub fn from_settings(
        settings: &LoaderSettings,
        capacity: usize,
        resolver: Arc<dyn BatchFunction<K, V>>,
    ) -> Self {
        Self::new(capacity, resolver, &strategy_factory(settings))
    }

    /// Wraps an already constructed strategy.
    pub fn with_strategy(strategy: Arc<dyn Strategy<K, V>>) -> Self {
        Self { strategy }
    }

    pub async fn load(&self, ctx: &CancellationToken, key: K) -> Thunk<V> {
        self.strategy.load(ctx, key).await
    }

    pub async fn load_many(&self, ctx: &CancellationToken, keys: Vec<K>) -> ThunkMany<V> {
        self.strategy.load_many(ctx, keys).await
    }

    /// Counts a call toward the window without requesting any key.
    pub async fn load_noop(&self, ctx: &CancellationToken) {
        self.strategy.load_noop(ctx).await;
    }
}

/// Returns the factory for the strategy selected in `settings`.
pub fn strategy_factory<K, V>(settings: &LoaderSettings) -> StrategyFactory<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    match settings.strategy.kind {
        StrategyKind::Standard => StandardStrategy::factory(settings.standard_options()),
        StrategyKind::Once => OnceStrategy::factory(settings.once_options()),
    }
}
