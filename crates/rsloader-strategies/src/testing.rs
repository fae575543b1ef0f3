//! Shared test doubles for strategy tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rsloader_domain::{BatchFunction, CancellationToken, Keys, LoadError, LoadResult, ResultMap};

use crate::logging::LoadLogger;

/// Resolver over `u64` keys that records every invocation.
///
/// Each resolved value is `"{key}_{suffix}"` so results are uniquely
/// identifiable per test.
pub(crate) struct CountingResolver {
    suffix: String,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<u64>>>,
    delay: Option<Duration>,
    missing: HashSet<u64>,
    skipped: HashSet<u64>,
    failing: HashSet<u64>,
}

impl CountingResolver {
    pub(crate) fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            calls: AtomicUsize::new(0),
            batches: Mutex::new(Vec::new()),
            delay: None,
            missing: HashSet::new(),
            skipped: HashSet::new(),
            failing: HashSet::new(),
        }
    }

    /// Sleeps for `delay` before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Marks these keys as explicitly missing.
    pub(crate) fn with_missing(mut self, keys: impl IntoIterator<Item = u64>) -> Self {
        self.missing.extend(keys);
        self
    }

    /// Leaves these keys out of the result map.
    pub(crate) fn with_skipped(mut self, keys: impl IntoIterator<Item = u64>) -> Self {
        self.skipped.extend(keys);
        self
    }

    /// Reports a per-key error for these keys.
    pub(crate) fn with_failing(mut self, keys: impl IntoIterator<Item = u64>) -> Self {
        self.failing.extend(keys);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Keys received by each invocation, in call order.
    pub(crate) fn batches(&self) -> Vec<Vec<u64>> {
        self.batches.lock().unwrap().clone()
    }

    pub(crate) fn expected(&self, key: u64) -> String {
        format!("{key}_{}", self.suffix)
    }
}

#[async_trait]
impl BatchFunction<u64, String> for CountingResolver {
    async fn load(&self, _ctx: &CancellationToken, keys: &Keys<u64>) -> ResultMap<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.batches.lock().unwrap().push(keys.raw_keys());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut results = ResultMap::with_capacity(keys.len());
        for key in keys {
            if self.skipped.contains(key) {
                continue;
            }
            if self.missing.contains(key) {
                results.set_missing(key);
            } else if self.failing.contains(key) {
                results.set(key, LoadResult::err(LoadError::resolver(format!("no row {key}"))));
            } else {
                results.set(key, LoadResult::ok(self.expected(*key)));
            }
        }
        results
    }
}

/// Logger that keeps every message for later assertions.
#[derive(Default)]
pub(crate) struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl LoadLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
