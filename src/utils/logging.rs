//! Logging setup.
//!
//! Installs a global `tracing` subscriber from [`LoggingConfig`]. `RUST_LOG`
//! takes precedence over the configured level when set.

use crate::config::LoggingConfig;
use crate::error::{Result, SniffError};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Fails with `ConfigError` if the log file cannot be opened or a subscriber
/// is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match (config.log_to_file, config.json_format) {
        (true, json) => {
            let path = config.log_file_path.as_deref().ok_or_else(|| {
                SniffError::ConfigError(
                    "log_file_path must be specified when log_to_file is true".into(),
                )
            })?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| SniffError::ConfigError(format!("Failed to open log file: {e}")))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            if json {
                builder.json().try_init()
            } else {
                builder.try_init()
            }
        }
        (false, true) => builder.json().try_init(),
        (false, false) => builder.try_init(),
    };

    installed.map_err(|e| SniffError::ConfigError(format!("Failed to install logger: {e}")))
}
