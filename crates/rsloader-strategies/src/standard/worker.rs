//! The background task that owns a window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rsloader_domain::{BatchFunction, CancellationToken, Key, Keys};
use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::types::{WindowOutcome, WindowState, WorkerStatus};
use crate::counter::Counter;
use crate::logging::LoadLogger;

/// Worker lifecycle plus the queue end the worker will consume.
///
/// This is the only state behind a lock; it guards the check-and-launch on
/// the first call of a window.
pub(crate) struct WorkerSlot<K> {
    pub(crate) status: WorkerStatus,
    pub(crate) receiver: Option<mpsc::Receiver<Vec<K>>>,
}

impl<K> WorkerSlot<K> {
    pub(crate) fn new(receiver: mpsc::Receiver<Vec<K>>) -> Self {
        Self {
            status: WorkerStatus::NotRunning,
            receiver: Some(receiver),
        }
    }
}

pub(crate) fn lock_slot<K>(slot: &Mutex<WorkerSlot<K>>) -> std::sync::MutexGuard<'_, WorkerSlot<K>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accumulates keys for one window and invokes the resolver when it closes.
///
/// The key set and counter are owned here exclusively, so appending needs
/// no lock.
pub(crate) struct Worker<K: Key, V> {
    resolver: Arc<dyn BatchFunction<K, V>>,
    logger: Arc<dyn LoadLogger>,
    timeout: Duration,
    keys: Keys<K>,
    counter: Counter,
}

impl<K, V> Worker<K, V>
where
    K: Key,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        resolver: Arc<dyn BatchFunction<K, V>>,
        logger: Arc<dyn LoadLogger>,
        timeout: Duration,
        capacity: usize,
    ) -> Self {
        Self {
            resolver,
            logger,
            timeout,
            keys: Keys::with_capacity(capacity),
            counter: Counter::new(capacity),
        }
    }

    /// Runs the window to completion.
    ///
    /// The deadline is armed once, when this starts. The queue is dropped on
    /// return so late senders fail fast instead of waiting on a closed window.
    pub(crate) async fn run(
        mut self,
        ctx: CancellationToken,
        mut receiver: mpsc::Receiver<Vec<K>>,
    ) -> WindowOutcome<V> {
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        let outcome = loop {
            tokio::select! {
                biased;

                () = ctx.cancelled() => {
                    self.logger.log("worker cancelled");
                    break WindowOutcome::Cancelled;
                }
                batch = receiver.recv() => {
                    let Some(batch) = batch else {
                        // Every sender is gone; nobody else can join
                        break self.resolve(&ctx, "closed").await;
                    };
                    self.keys.append(batch);
                    if self.counter.increment() {
                        break self.resolve(&ctx, "capacity").await;
                    }
                }
                () = &mut deadline => {
                    break self.resolve(&ctx, "timeout").await;
                }
            }
        };

        drop(receiver);
        self.keys.clear();
        self.counter.reset();
        outcome
    }

    async fn resolve(&self, ctx: &CancellationToken, reason: &'static str) -> WindowOutcome<V> {
        debug!(
            keys = self.keys.len(),
            calls = self.counter.count(),
            reason,
            "window closed"
        );
        let results = self.resolver.load(ctx, &self.keys).await;
        WindowOutcome::Resolved(Arc::new(results))
    }
}

/// Publishes a window's outcome and marks its worker as ran.
///
/// Dropping the guard without publishing (the worker panicked) releases the
/// waiters with [`WindowOutcome::Abandoned`].
pub(crate) struct WindowGuard<K, V> {
    slot: Arc<Mutex<WorkerSlot<K>>>,
    signal: Arc<watch::Sender<WindowState<V>>>,
    published: bool,
}

impl<K, V> WindowGuard<K, V> {
    pub(crate) fn new(
        slot: Arc<Mutex<WorkerSlot<K>>>,
        signal: Arc<watch::Sender<WindowState<V>>>,
    ) -> Self {
        Self {
            slot,
            signal,
            published: false,
        }
    }

    pub(crate) fn publish(mut self, outcome: WindowOutcome<V>) {
        self.close(outcome);
        self.published = true;
    }

    fn close(&self, outcome: WindowOutcome<V>) {
        lock_slot(&self.slot).status = WorkerStatus::Ran;
        self.signal.send_replace(WindowState::Closed(outcome));
    }
}

impl<K, V> Drop for WindowGuard<K, V> {
    fn drop(&mut self) {
        if !self.published {
            self.close(WindowOutcome::Abandoned);
        }
    }
}

/// Waits for the window to close and returns what it published.
pub(crate) async fn wait_closed<V: Clone>(
    mut receiver: watch::Receiver<WindowState<V>>,
) -> WindowOutcome<V> {
    let closed = receiver.wait_for(WindowState::is_closed).await;
    closed_outcome(closed)
}

fn closed_outcome<V: Clone>(
    closed: Result<watch::Ref<'_, WindowState<V>>, watch::error::RecvError>,
) -> WindowOutcome<V> {
    match closed.as_deref() {
        Ok(WindowState::Closed(outcome)) => outcome.clone(),
        // The signal went away without a close
        Ok(WindowState::Open) | Err(_) => WindowOutcome::Abandoned,
    }
}
