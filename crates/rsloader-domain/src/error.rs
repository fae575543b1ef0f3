//! Error types carried inside per-key load results.

use thiserror::Error;

/// Per-key failure reported back to the caller that requested the key.
///
/// Errors travel inside a [`LoadResult`](crate::LoadResult) and are shared by
/// every caller whose key took part in the same resolver invocation, so they
/// must be cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The resolver could not produce a value for the key.
    #[error("resolver error: {message}")]
    Resolver { message: String },

    /// A detached resolver task panicked or was aborted before replying.
    #[error("resolver task failed: {message}")]
    TaskFailed { message: String },
}

impl LoadError {
    /// Creates a resolver error from any displayable message.
    pub fn resolver(message: impl Into<String>) -> Self {
        LoadError::Resolver {
            message: message.into(),
        }
    }
}
