//! Logging configuration using tracing

use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding the filter directive
pub const LOG_ENV_VAR: &str = "CARPARK_LOG";

const DEFAULT_FILTER: &str = "carpark=info,carpark_server=info,carpark_runner=info,warn";
const LOG_FILE_NAME: &str = "carpark.log";

/// Initialize the logging subsystem
///
/// Logs always go to stderr. When `log_dir` is given, a daily-rotated copy is
/// also written to `<log_dir>/carpark.log.<date>`.
/// Log level is controlled by the `CARPARK_LOG` environment variable, falling
/// back to `default_filter` and then to info for the carpark crates.
///
/// # Examples
/// ```bash
/// CARPARK_LOG=debug carpark serve
/// CARPARK_LOG=carpark_server=trace carpark serve
/// ```
pub fn init(default_filter: Option<&str>, log_dir: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER)));

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_NAME);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(fmt::time::ChronoLocal::new(
                        "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                    )),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))?;

    if let Some(dir) = log_dir {
        tracing::info!("Log directory: {}", dir.display());
    }

    Ok(())
}

/// Default directory for log files: `<data_local_dir>/carpark/logs`
pub fn default_log_directory() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("carpark").join("logs")
}
