//! Logging initialisation
//!
//! The library only emits `tracing` events; binaries and test harnesses call
//! [`init_logging`] once to install a subscriber. `RUST_LOG` overrides the
//! default filter.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{Result, TaplineError};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,tapline_rs=debug";

/// Subscriber options
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Filter directives used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Also write daily-rotated log files here
    pub log_dir: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_FILTER.to_string(),
            log_dir: None,
            file_prefix: "tapline.log".to_string(),
        }
    }
}

impl LoggingOptions {
    /// Builder: add a rolling file output
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_filter)
            .map_err(|e| TaplineError::Config(format!("Invalid log filter: {}", e)))
    }
}

/// Install the global subscriber
///
/// Returns the file writer guard when a log directory is configured; keep it
/// alive until shutdown or buffered lines are lost. Fails if a global
/// subscriber is already set.
pub fn init_logging(options: &LoggingOptions) -> Result<Option<WorkerGuard>> {
    let filter = options.filter()?;

    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, &options.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| TaplineError::Config(format!("Logging already initialised: {}", e)))?;

    tracing::debug!(log_dir = ?options.log_dir, "Logging initialised");
    Ok(guard)
}
