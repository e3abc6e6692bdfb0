//! Tracing subscriber setup.
//!
//! Library code only emits `tracing` events; nothing is printed unless the
//! host installs a subscriber. [`init`] installs the usual one: an
//! `EnvFilter` (`RUST_LOG` wins over the configured directives), a console
//! formatter, and optionally a daily rolling file written off-thread.

use crate::config::LoggingConfig;
use crate::error::{Result, StageGraphError};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` if set and valid, else the configured
/// directives.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| {
        StageGraphError::Logging(format!("Invalid filter '{}': {}", config.filter, e))
    })
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when `log_dir` is set; keep it alive for
/// as long as logs should be flushed. Fails if a global subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                StageGraphError::Logging(format!("Failed to create log directory {:?}: {}", dir, e))
            })?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| StageGraphError::Logging(format!("Failed to install subscriber: {}", e)))?;

    tracing::debug!(filter = %config.filter, log_dir = ?config.log_dir, "Logging initialised");
    Ok(guard)
}
