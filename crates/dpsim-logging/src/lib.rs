//! Structured logging setup for dpsim binaries and tests
//!
//! Every dpsim crate logs through `tracing`; this crate installs the global
//! subscriber that decides where those events go.
//!
//! # Features
//!
//! - **JSON lines** on the console by default, or pretty human-readable output
//! - **File output** via tracing-appender, optionally rotated daily or hourly
//! - **`RUST_LOG`** overrides the configured level
//!
//! # Quick Start
//!
//! ```no_run
//! use dpsim_logging::{DpsimSubscriberBuilder, LogConfig};
//!
//! // Keep the guard alive until exit so buffered file output is flushed
//! let _guard = DpsimSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init()
//!     .unwrap();
//!
//! tracing::info!(packets = 3, "Run complete");
//! ```

pub mod config;

pub use config::{ConsoleConfig, FileConfig, JsonConfig, LogConfig, RotationStrategy};

use std::fs::{self, File};
use std::io;

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to create rolling log appender: {0}")]
    Appender(#[from] InitError),

    /// A global subscriber is already installed
    #[error("Failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Builder for configuring and initializing the dpsim logging subscriber
///
/// By default, console output uses JSON lines. Use `LogConfig::development()`
/// for human-readable pretty output during development.
#[derive(Debug, Clone, Default)]
pub struct DpsimSubscriberBuilder {
    config: LogConfig,
}

impl DpsimSubscriberBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Install the subscriber globally
    ///
    /// Returns the file writer's guard when file output is configured; it
    /// must be kept alive for the duration of the program.
    pub fn init(self) -> Result<Option<WorkerGuard>, LoggingError> {
        let config = self.config;
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

        let console = &config.console;
        let json = &config.json;

        let pretty_console = (console.enabled && console.pretty).then(|| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(console.ansi)
                .with_target(true)
        });

        let json_console = (console.enabled && !console.pretty).then(|| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(json.include_spans)
                .flatten_event(json.flatten_events)
                .with_file(json.include_location)
                .with_line_number(json.include_location)
                .with_writer(io::stderr)
        });

        let (file_layer, guard) = match &config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                let layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(json.include_spans)
                    .flatten_event(json.flatten_events)
                    .with_file(json.include_location)
                    .with_line_number(json.include_location)
                    .with_ansi(false)
                    .with_writer(writer);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        Registry::default()
            .with(env_filter)
            .with(pretty_console)
            .with(json_console)
            .with(file_layer)
            .try_init()?;

        Ok(guard)
    }
}

/// Non-blocking writer for file output
///
/// `Never` truncates a single `<prefix>.log`; the rotating strategies append.
fn file_writer(config: &FileConfig) -> Result<(NonBlocking, WorkerGuard), LoggingError> {
    let rotation = match config.rotation {
        RotationStrategy::Never => {
            fs::create_dir_all(&config.directory)?;
            let file = File::create(config.directory.join(format!("{}.log", config.prefix)))?;
            return Ok(tracing_appender::non_blocking(file));
        }
        RotationStrategy::Daily => Rotation::DAILY,
        RotationStrategy::Hourly => Rotation::HOURLY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .build(&config.directory)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() -> Result<Option<WorkerGuard>, LoggingError> {
    DpsimSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Initialize logging for testing (minimal output)
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_testing() {
    let _ = DpsimSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = DpsimSubscriberBuilder::new();
        assert_eq!(builder.config().default_level, "info");
        assert!(!builder.config().console.pretty);
    }

    #[test]
    fn test_builder_overrides() {
        let builder = DpsimSubscriberBuilder::new()
            .with_config(LogConfig::development())
            .with_level("trace")
            .with_console(false);
        assert_eq!(builder.config().default_level, "trace");
        assert!(!builder.config().console.enabled);
        assert!(builder.config().console.pretty);
    }

    #[test]
    fn test_single_file_writer_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "stale").unwrap();

        let config = FileConfig {
            directory: dir.path().to_path_buf(),
            prefix: "run".to_string(),
            rotation: RotationStrategy::Never,
        };
        let (_writer, guard) = file_writer(&config).unwrap();
        drop(guard);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_init_installs_once() {
        let dir = tempfile::tempdir().unwrap();
        let builder = DpsimSubscriberBuilder::new()
            .with_config(LogConfig::testing())
            .with_file_output(FileConfig {
                directory: dir.path().join("logs"),
                prefix: "dpsim".to_string(),
                rotation: RotationStrategy::Never,
            });

        let guard = builder.clone().init().unwrap();
        assert!(guard.is_some());
        assert!(dir.path().join("logs").join("dpsim.log").exists());

        assert!(matches!(builder.init(), Err(LoggingError::Init(_))));
    }
}
