//! Logger collaborator and structured logging setup.
//!
//! Strategies report lifecycle notices (such as a cancelled window) through a
//! [`LoadLogger`]. The default [`TracingLogger`] forwards those notices to
//! `tracing`, so they end up in whatever subscriber the application installed
//! with [`init_logging`].
//!
//! # Log Format
//!
//! When JSON formatting is enabled, log entries are output as JSON objects:
//!
//! ```json
//! {"timestamp":"2024-01-15T10:30:00.000Z","level":"INFO","target":"rsloader","fields":{"message":"worker cancelled"}}
//! ```

use std::fmt;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self as fmt_layer, MakeWriter},
    prelude::*,
    EnvFilter,
};

/// Target used for notices emitted through [`TracingLogger`].
pub const LOG_TARGET: &str = "rsloader";

/// Sink for free-form and formatted strategy notices.
pub trait LoadLogger: Send + Sync {
    /// Logs a single message.
    fn log(&self, message: &str);

    /// Logs a formatted message, e.g. `logger.log_fmt(format_args!("{n} keys"))`.
    fn log_fmt(&self, args: fmt::Arguments<'_>) {
        self.log(&args.to_string());
    }
}

/// Forwards notices to the `tracing` subscriber at INFO level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl LoadLogger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: LOG_TARGET, "{message}");
    }
}

/// Output format for loader diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Subscriber settings derived from [`LoggingSettings`](crate::config::LoggingSettings).
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level applied when `RUST_LOG` is not set.
    pub level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            ..Default::default()
        }
    }

    pub fn text() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Filter admitting events at or above the configured level.
    pub fn filter(&self) -> EnvFilter {
        EnvFilter::new(self.level.to_string())
    }
}

/// A type-erased subscriber, so both formats share one return type.
pub type BoxedSubscriber = Box<dyn tracing::Subscriber + Send + Sync>;

/// Builds a subscriber for `config` that writes through `writer`.
pub fn build_subscriber<W>(config: &LoggingConfig, filter: EnvFilter, writer: W) -> BoxedSubscriber
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => Box::new(
            registry.with(
                fmt_layer::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_current_span(true),
            ),
        ),
        LogFormat::Text => Box::new(
            registry.with(
                fmt_layer::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true),
            ),
        ),
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over the configured level. Returns false if
/// a global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config.filter());
    let subscriber = build_subscriber(config, filter, std::io::stderr);
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
