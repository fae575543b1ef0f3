//! Call counter for a batching window.

/// Counts load calls made against the current window.
///
/// The counter has no synchronization of its own; it is owned by the single
/// task that aggregates a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    count: usize,
    target: usize,
}

impl Counter {
    /// Creates a counter that reports when `target` calls have been made.
    pub fn new(target: usize) -> Self {
        Self { count: 0, target }
    }

    /// Records one call. Returns true iff this call reached the target.
    ///
    /// A target of zero is never reached, so such a window only closes on
    /// its timeout.
    pub fn increment(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.target > 0 && self.count == self.target
    }

    /// Returns the counter to zero.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn target(&self) -> usize {
        self.target
    }
}
