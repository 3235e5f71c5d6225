//! Logging setup for the application.

use crate::config::{AppConfig, GlobalLogLevel, ProgressLogLevel};
use env_logger::Builder;
use log::LevelFilter;

/// Module whose level is set by `--progress-log-level`.
pub const PROGRESS_MODULE: &str = "tile_forge_app::progress";

impl From<ProgressLogLevel> for LevelFilter {
    fn from(level: ProgressLogLevel) -> Self {
        match level {
            ProgressLogLevel::Trace => Self::Trace,
            ProgressLogLevel::Debug => Self::Debug,
            ProgressLogLevel::Info => Self::Info,
            ProgressLogLevel::Warn => Self::Warn,
        }
    }
}

impl From<GlobalLogLevel> for LevelFilter {
    fn from(level: GlobalLogLevel) -> Self {
        match level {
            GlobalLogLevel::Trace => Self::Trace,
            GlobalLogLevel::Debug => Self::Debug,
            GlobalLogLevel::Info => Self::Info,
            GlobalLogLevel::Warn => Self::Warn,
            GlobalLogLevel::Error => Self::Error,
        }
    }
}

/// Initializes the logger with the appropriate configuration based on the application settings.
///
/// This function configures the log levels for the different components of the application:
/// - The progress reports use the level specified in `config.progress_log_level`
/// - Everything else starts at `config.global_log_level`
///
/// Directives in `RUST_LOG` are applied last, so they win over both flags.
pub fn init_logger(config: &AppConfig) {
    let mut builder = Builder::new();
    builder.filter_level(config.global_log_level.into());
    builder.filter_module(PROGRESS_MODULE, config.progress_log_level.into());
    if let Ok(directives) = std::env::var("RUST_LOG") {
        builder.parse_filters(&directives);
    }

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized, keeping the existing one");
        return;
    }

    log::debug!(
        "Logger initialized with global log level: {:?}, progress log level: {:?}",
        config.global_log_level,
        config.progress_log_level
    );
}
