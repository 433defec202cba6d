//! Tracing setup.
//!
//! The terminal belongs to the TUI, so events go to a daily rolling file
//! instead of stderr.

use std::fs;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::{LoggingSettings, default_log_dir};

/// Environment variable that overrides `logging.level`.
pub const LOG_ENV: &str = "TUNETREE_LOG";

/// Resolve where log files go: `logging.dir`, else the XDG state dir, else `./logs`.
pub fn log_dir(settings: &LoggingSettings) -> PathBuf {
    settings
        .dir
        .clone()
        .or_else(default_log_dir)
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Install the global subscriber. Call once near the start of the run; keep
/// the returned guard alive until exit so buffered lines are flushed.
pub fn init(settings: &LoggingSettings) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let dir = log_dir(settings);
    fs::create_dir_all(&dir)?;

    let (writer, guard) = tracing_appender::non_blocking(rolling::daily(&dir, "tunetree.log"));

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter),
        )
        .try_init()?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_prefers_configured_dir() {
        let settings = LoggingSettings {
            dir: Some(PathBuf::from("/tmp/tunetree-logs")),
            ..LoggingSettings::default()
        };
        assert_eq!(log_dir(&settings), PathBuf::from("/tmp/tunetree-logs"));
    }
}
