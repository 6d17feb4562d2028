use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::{CallShieldError, Result};

/// Initialize the structured logging system.
///
/// `RUST_LOG` wins over the configured level. When a log file is given the
/// console layer is joined by a daily-rotated JSON file layer; the returned
/// guard must be held for the life of the process or buffered file output
/// is lost on exit.
pub fn init_logging(log_level: Option<&str>, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .map_err(|e| CallShieldError::InvalidConfig(format!("invalid log filter: {e}")))?;

    let registry = Registry::default().with(env_filter);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true);

    if let Some(log_path) = log_file {
        let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = log_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("callshield.log"));

        let file_appender = rolling::daily(directory, file_name);
        let (writer, guard) = non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .json();

        registry.with(console_layer).with(file_layer).init();
        info!("logging initialized");
        Ok(Some(guard))
    } else {
        registry.with(console_layer).init();
        info!("logging initialized");
        Ok(None)
    }
}

/// Logs how long a named operation took, either explicitly via `finish`
/// or on drop.
pub struct OperationTimer {
    operation: String,
    start: std::time::Instant,
    finished: bool,
}

impl OperationTimer {
    /// Start timing `operation`.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: std::time::Instant::now(),
            finished: false,
        }
    }

    /// Stop the timer and log at info level, returning the elapsed
    /// milliseconds.
    pub fn finish(mut self) -> u64 {
        self.finished = true;
        let duration = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            operation = %self.operation,
            duration_ms = duration,
            "operation completed"
        );
        duration
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.finished && !std::thread::panicking() {
            let duration = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration,
                "operation finished"
            );
        }
    }
}
