//! Logging setup for applications embedding the cache.
//!
//! Structured `tracing` output goes to both a log file and stdout:
//! - File output is non-blocking and truncated at session start
//! - Filter level comes from `RUST_LOG`, defaulting to `info`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default directory for log files.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "vision-cache.log";

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
    log_path: PathBuf,
}

impl LoggingGuard {
    /// Path of the active log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or the log
/// file cannot be truncated.
pub fn init_logging(log_dir: &Path, log_file: &str) -> Result<LoggingGuard, io::Error> {
    let log_path = prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
        log_path,
    })
}

/// Create the log directory and truncate the log file.
fn prepare_log_file(log_dir: &Path, log_file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(log_file);
    fs::write(&log_path, "")?;
    Ok(log_path)
}
