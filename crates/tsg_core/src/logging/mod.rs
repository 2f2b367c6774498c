//! Logging for TS Graph.
//!
//! Two layers: crate diagnostics go through `tracing`, and each analysis
//! run additionally writes its own log file (with an optional GUI mirror)
//! through [`RunLogger`].

mod run_logger;

pub use run_logger::{GuiLogCallback, LogConfig, RunLogger};

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Output goes to stderr.
/// Call once at application startup.
pub fn init_tracing(default_level: Level) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(env_filter(default_level))
        .init();
}

/// Initialize tracing with an additional non-blocking daily log file.
///
/// Returns the appender guard; diagnostics may be lost if it is dropped
/// before shutdown.
pub fn init_tracing_with_file(log_dir: impl AsRef<Path>, default_level: Level) -> WorkerGuard {
    let appender = tracing_appender::rolling::daily(log_dir.as_ref(), "tsgraph.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter(default_level))
        .init();

    guard
}

fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_becomes_a_filter_directive() {
        // EnvFilter accepts level names case-insensitively
        assert_eq!(Level::DEBUG.to_string(), "DEBUG");
        let _ = EnvFilter::new(Level::DEBUG.to_string());
    }
}
