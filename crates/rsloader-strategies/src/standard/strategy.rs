//! Windowed strategy implementation.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rsloader_domain::{
    BatchFunction, CancellationToken, Deferred, Key, Keys, LoadError, LoadResult, Outcome,
    ResultMap, Thunk, ThunkMany,
};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::types::{
    StandardOptions, WindowOutcome, WindowState, WorkerStatus, MIN_QUEUE_CAPACITY,
};
use super::worker::{lock_slot, wait_closed, WindowGuard, Worker, WorkerSlot};
use crate::strategy::{Strategy, StrategyFactory};

/// Strategy that coalesces the calls of one window into a single resolver
/// invocation.
///
/// Each instance serves exactly one window. Once it has closed, later calls
/// are resolved individually; build a new instance (usually through
/// [`StandardStrategy::factory`]) for the next window.
///
/// # Example
///
/// ```ignore
/// let strategy = StandardStrategy::new(3, resolver, StandardOptions::default());
/// let first = strategy.load(&ctx, 1).await;
/// let second = strategy.load(&ctx, 2).await;
/// strategy.load_noop(&ctx).await;
///
/// // One resolver call with keys {1, 2}
/// let (result, found) = first.get().await;
/// ```
pub struct StandardStrategy<K: Key, V> {
    resolver: Arc<dyn BatchFunction<K, V>>,
    options: StandardOptions,
    capacity: usize,
    slot: Arc<Mutex<WorkerSlot<K>>>,
    sender: mpsc::Sender<Vec<K>>,
    signal: Arc<watch::Sender<WindowState<V>>>,
}

impl<K, V> StandardStrategy<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a windowed strategy that closes after `capacity` calls.
    ///
    /// A capacity of zero never closes by count; the window then waits for
    /// its timeout.
    pub fn new(
        capacity: usize,
        resolver: Arc<dyn BatchFunction<K, V>>,
        options: StandardOptions,
    ) -> Self {
        // Zero set through the public field still means the default
        let timeout = options.timeout;
        let options = options.with_timeout(timeout);
        let (sender, receiver) = mpsc::channel(capacity.max(MIN_QUEUE_CAPACITY));
        let (signal, _) = watch::channel(WindowState::Open);

        Self {
            resolver,
            options,
            capacity,
            slot: Arc::new(Mutex::new(WorkerSlot::new(receiver))),
            sender,
            signal: Arc::new(signal),
        }
    }

    /// Returns a factory producing windowed strategies with `options`.
    pub fn factory(options: StandardOptions) -> StrategyFactory<K, V> {
        Arc::new(move |capacity: usize, resolver: Arc<dyn BatchFunction<K, V>>| {
            Arc::new(StandardStrategy::new(capacity, resolver, options.clone()))
                as Arc<dyn Strategy<K, V>>
        })
    }

    /// Returns the current worker lifecycle state.
    pub fn status(&self) -> WorkerStatus {
        lock_slot(&self.slot).status
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The deadline each window is given once its worker starts.
    pub fn timeout(&self) -> Duration {
        self.options.timeout
    }

    /// Launches the worker if this is the first call of the window.
    fn start_worker(&self, ctx: &CancellationToken) {
        let receiver = {
            let mut slot = lock_slot(&self.slot);
            if slot.status != WorkerStatus::NotRunning {
                return;
            }
            let Some(receiver) = slot.receiver.take() else {
                return;
            };
            slot.status = WorkerStatus::Running;
            receiver
        };

        debug!(capacity = self.capacity, timeout = ?self.options.timeout, "window opened");

        let worker = Worker::new(
            Arc::clone(&self.resolver),
            Arc::clone(&self.options.logger),
            self.options.timeout,
            self.capacity,
        );
        let guard = WindowGuard::new(Arc::clone(&self.slot), Arc::clone(&self.signal));
        let ctx = ctx.clone();

        tokio::spawn(async move {
            let outcome = worker.run(ctx, receiver).await;
            guard.publish(outcome);
        });
    }

    /// Hands one call's keys to the worker.
    async fn submit(&self, ctx: &CancellationToken, keys: Vec<K>) {
        self.start_worker(ctx);
        // A closed queue means the window already closed; the accessor
        // resolves these keys individually.
        let _ = self.sender.send(keys).await;
    }
}

#[async_trait]
impl<K, V> Strategy<K, V> for StandardStrategy<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self, ctx: &CancellationToken, key: K) -> Thunk<V> {
        self.submit(ctx, vec![key.clone()]).await;

        let closed = self.signal.subscribe();
        let resolver = Arc::clone(&self.resolver);
        let ctx = ctx.clone();

        Deferred::new(async move {
            match wait_closed(closed).await {
                WindowOutcome::Resolved(results) => match results.outcome(&key) {
                    Some(Outcome::Resolved(result)) => (result.clone(), true),
                    Some(Outcome::Missing) => (LoadResult::empty(), false),
                    None => resolve_individually(resolver.as_ref(), &ctx, key).await,
                },
                WindowOutcome::Cancelled => (LoadResult::empty(), false),
                WindowOutcome::Abandoned => (LoadResult::err(abandoned_error()), true),
            }
        })
    }

    async fn load_many(&self, ctx: &CancellationToken, keys: Vec<K>) -> ThunkMany<V> {
        let keys = Keys::from_keys(keys);
        self.submit(ctx, keys.as_slice().to_vec()).await;

        let closed = self.signal.subscribe();
        let resolver = Arc::clone(&self.resolver);
        let ctx = ctx.clone();

        Deferred::new(async move {
            match wait_closed(closed).await {
                WindowOutcome::Resolved(results) => {
                    distribute(resolver.as_ref(), &ctx, &keys, &results).await
                }
                WindowOutcome::Cancelled => ResultMap::new(),
                WindowOutcome::Abandoned => ResultMap::fail_all(&keys, abandoned_error()),
            }
        })
    }

    async fn load_noop(&self, ctx: &CancellationToken) {
        self.submit(ctx, Vec::new()).await;
    }
}

/// Resolves a key the window result did not mention.
async fn resolve_individually<K, V>(
    resolver: &dyn BatchFunction<K, V>,
    ctx: &CancellationToken,
    key: K,
) -> (LoadResult<V>, bool)
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    if ctx.is_cancelled() {
        return (LoadResult::empty(), false);
    }
    debug!(key = %key.key_id(), "key absent from window result, resolving individually");
    let keys = Keys::from_keys([key.clone()]);
    resolver.load(ctx, &keys).await.get_value(&key)
}

/// Builds one caller's result map from the shared window result.
///
/// Keys the window resolved are copied, missing keys are left out, and the
/// remaining keys are resolved together in one supplemental call.
async fn distribute<K, V>(
    resolver: &dyn BatchFunction<K, V>,
    ctx: &CancellationToken,
    keys: &Keys<K>,
    window: &ResultMap<V>,
) -> ResultMap<V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    let mut results = ResultMap::with_capacity(keys.len());
    let mut unresolved = Keys::with_capacity(keys.len());

    for key in keys {
        match window.outcome(key) {
            Some(Outcome::Resolved(result)) => results.set(key, result.clone()),
            Some(Outcome::Missing) => {}
            None => unresolved.append([key.clone()]),
        }
    }

    if unresolved.is_empty() || ctx.is_cancelled() {
        return results;
    }

    debug!(keys = unresolved.len(), "keys absent from window result, resolving together");
    let supplemental = resolver.load(ctx, &unresolved).await;
    for (id, outcome) in supplemental.iter() {
        if let Outcome::Resolved(_) = outcome {
            results.insert_outcome(id.clone(), outcome.clone());
        }
    }
    results
}

fn abandoned_error() -> LoadError {
    LoadError::TaskFailed {
        message: "window worker stopped before publishing results".to_string(),
    }
}
