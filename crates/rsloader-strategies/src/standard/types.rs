//! Options and state types for the windowed strategy.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rsloader_domain::ResultMap;

use crate::logging::{LoadLogger, TracingLogger};

/// Window deadline used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(6);

/// Lower bound on the key queue size so small windows never block senders.
pub(crate) const MIN_QUEUE_CAPACITY: usize = 5;

/// Options for the windowed strategy.
#[derive(Clone)]
pub struct StandardOptions {
    /// How long a window stays open after its worker starts.
    pub timeout: Duration,
    /// Sink for window lifecycle notices.
    pub logger: Arc<dyn LoadLogger>,
}

impl Default for StandardOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            logger: Arc::new(TracingLogger),
        }
    }
}

impl StandardOptions {
    /// Sets the window timeout. A zero duration selects [`DEFAULT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// Sets the logger.
    pub fn with_logger(mut self, logger: Arc<dyn LoadLogger>) -> Self {
        self.logger = logger;
        self
    }
}

impl fmt::Debug for StandardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardOptions")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Lifecycle of a strategy's window worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// No call has arrived yet.
    NotRunning,
    /// The worker is collecting keys.
    Running,
    /// The window has closed. A strategy never reopens it.
    Ran,
}

/// What the worker published when its window closed.
#[derive(Debug, Clone)]
pub(crate) enum WindowOutcome<V> {
    /// The resolver ran; every caller reads its keys from this map.
    Resolved(Arc<ResultMap<V>>),
    /// The governing context was cancelled before the resolver ran.
    Cancelled,
    /// The worker stopped without publishing (it panicked or was aborted).
    Abandoned,
}

/// Value carried by the window's completion signal.
#[derive(Debug, Clone)]
pub(crate) enum WindowState<V> {
    Open,
    Closed(WindowOutcome<V>),
}

impl<V> WindowState<V> {
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self, WindowState::Closed(_))
    }
}
