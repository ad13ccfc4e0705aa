//! Tracing subscriber setup for the command-line binary

use crate::config::{ConfigError, LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| ConfigError::Logging(format!("invalid level '{}': {}", config.level, e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}
