//! File-based logging initialization

use super::config::LogConfig;
use crate::core::error::{Result, WidgetError};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the global subscriber
///
/// - Daily log rotation under `log_dir`
/// - Non-blocking writes; buffered lines are flushed when the returned guard drops
/// - Optional stderr mirror
///
/// Fails if the directory cannot be created, the filter does not parse, or a
/// global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir).map_err(|e| {
        WidgetError::Logging(format!("cannot create {}: {}", config.log_dir.display(), e))
    })?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, &config.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| WidgetError::Logging(format!("invalid filter {}: {}", config.log_level, e)))?;

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI codes in log files

    let stderr_layer = config
        .log_to_stderr
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(false).boxed());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| WidgetError::Logging(e.to_string()))?;

    tracing::info!(
        log_file = %config.log_file().display(),
        log_level = %config.log_level,
        "Widget logging initialized"
    );

    Ok(guard)
}
