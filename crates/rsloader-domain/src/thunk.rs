//! Memoized deferred accessors returned by load calls.
//!
//! A [`Deferred`] wraps the work needed to produce a caller's result. The
//! first `get().await` drives that work to completion; every later call, from
//! any clone of the accessor, returns the cached value without running it
//! again.

use std::fmt;
use std::future::Future;

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::result::{LoadResult, ResultMap};

/// Deferred result of a single-key load: the result and whether it was found.
pub type Thunk<V> = Deferred<(LoadResult<V>, bool)>;

/// Deferred result of a multi-key load.
pub type ThunkMany<V> = Deferred<ResultMap<V>>;

/// A cached, idempotent handle to a value that may not exist yet.
pub struct Deferred<T: Clone> {
    inner: Shared<BoxFuture<'static, T>>,
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an accessor that runs `future` the first time it is awaited.
    pub fn new<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            inner: future.boxed().shared(),
        }
    }

    /// Creates an accessor that has already completed with `value`.
    pub fn ready(value: T) -> Self {
        let inner = futures::future::ready(value).boxed().shared();
        // Completes immediately; polling once caches the value for peek().
        let _ = inner.clone().now_or_never();
        Self { inner }
    }

    /// Waits for the value, then returns a clone of it.
    pub async fn get(&self) -> T {
        self.inner.clone().await
    }

    /// Returns the cached value if the accessor has already completed.
    pub fn peek(&self) -> Option<T> {
        self.inner.peek().cloned()
    }

    pub fn is_ready(&self) -> bool {
        self.inner.peek().is_some()
    }
}

impl<T: Clone> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("ready", &self.inner.peek().is_some())
            .finish()
    }
}
