//! Tracing subscriber setup for the binary

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Where log lines are written
pub enum LogTarget<'a> {
    /// Append to a file (stdout stays free for command output)
    File(&'a Path),
    Stderr,
}

/// Install the global subscriber. The returned guard must be held until exit
/// so buffered lines are flushed.
pub fn init_logging(config: &LoggingConfig, target: LogTarget<'_>) -> anyhow::Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let (writer, guard) = match target {
        LogTarget::File(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)?;
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log path {:?} has no file name", path))?;
            tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name))
        }
        LogTarget::Stderr => tracing_appender::non_blocking(std::io::stderr()),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}
