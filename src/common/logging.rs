//! Diagnostic logging on stderr via `tracing-subscriber`.
//!
//! Standard output carries results only, so every log line goes to stderr.
//! `RUST_LOG` overrides the level chosen on the command line.

use std::io::IsTerminal;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level used when RUST_LOG is not set.
    pub default_level: Level,
    /// Prefix lines with the event target (module path).
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::WARN,
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Debug-level output including event targets, for `--verbose`.
    pub fn verbose() -> Self {
        Self {
            default_level: Level::DEBUG,
            with_target: true,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_level.to_string()))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(config: LoggingConfig) {
    let subscriber = tracing_subscriber::registry().with(env_filter(&config)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_target(config.with_target)
            .without_time(),
    );
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Subscriber writing plain text to `writer` at `level`, for capturing logs in tests.
pub fn capture_subscriber<W>(writer: W, level: Level) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'writer> fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new(level.to_string()))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .without_time(),
        )
}
