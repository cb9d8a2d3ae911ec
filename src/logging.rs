//! Structured logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber according to [`LoggingConfig`].

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{RedtapeError, Result};
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

/// Parse log level string to tracing Level
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level).map_err(|_| RedtapeError::ConfigError {
        message: format!("invalid log level: {level}"),
        field: Some("logging.level".to_string()),
    })
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` directives take precedence over the configured level. If a global
/// subscriber is already installed (common in tests) the call logs a warning and
/// returns `Ok`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoUtc::rfc_3339())
        .with_target(true);

    let installed = match &config.file_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            match config.format {
                LogFormat::Json => builder
                    .json()
                    .with_current_span(false)
                    .with_span_list(true)
                    .with_writer(file)
                    .try_init(),
                LogFormat::Pretty => builder.with_ansi(false).with_writer(file).try_init(),
                LogFormat::Compact => builder
                    .compact()
                    .with_ansi(false)
                    .with_writer(file)
                    .try_init(),
            }
        }
        None => match config.format {
            LogFormat::Json => builder
                .json()
                .with_current_span(false)
                .with_span_list(true)
                .try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        },
    };

    match installed {
        Ok(()) => info!(level = %config.level, format = %config.format, "logging initialized"),
        Err(e) => warn!("Failed to initialize tracing subscriber (may already be set): {}", e),
    }
    Ok(())
}
