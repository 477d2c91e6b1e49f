//! Logging setup.
//!
//! Human-readable output always goes to stderr. When a log directory is
//! configured, the same events are also written as JSON to a daily-rotated
//! file. `RUST_LOG` controls the level (default: `info`).

use std::path::Path;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// File name prefix for rotated logs.
const LOG_FILE_PREFIX: &str = "whatsapp-gateway.log";

/// Keeps the file writer alive. Dropping it flushes pending entries, so hold
/// it for the life of the process.
pub struct LoggingGuard {
    _file_writer: Option<WorkerGuard>,
}

/// Install the global subscriber: stderr always, JSON file under `log_dir`
/// when given.
///
/// # Errors
///
/// Returns an error if `log_dir` cannot be created or a global subscriber is
/// already installed.
pub fn init(log_dir: Option<&Path>) -> anyhow::Result<LoggingGuard> {
    let (file_layer, file_writer) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create logs directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    Ok(LoggingGuard {
        _file_writer: file_writer,
    })
}
