//! # Logging Module
//!
//! Builds the process logger from [`LogConfig`].
//!
//! - **File output** always: daily-rotated files named `<name>.<date>.log` in
//!   the configured directory, written off-thread through
//!   `tracing_appender::non_blocking`. Production keeps 30 files, every
//!   other environment keeps 1.
//! - **Console output** only when `ENV=dev`.
//! - **Filtering** through `EnvFilter`, seeded from the configured level.
//!
//! Keep the returned [`LogGuard`] alive for the life of the process; dropping
//! it flushes and stops the file writer.
//!
//! ```rust,no_run
//! use expressive::config::AppConfig;
//! use expressive::logging::init_logging;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = AppConfig::from_env()?;
//! let _guard = init_logging(&config.log_config())?;
//! tracing::info!(env = %config.env, "service starting");
//! # Ok(())
//! # }
//! ```

use crate::config::Env;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Rotated files kept in production.
pub const PROD_RETENTION_FILES: usize = 30;
/// Rotated files kept everywhere else.
pub const DEFAULT_RETENTION_FILES: usize = 1;

/// File log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Logger settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub env: Env,
    /// Logger name, used as the log file prefix
    pub name: String,
    pub directory: PathBuf,
    /// `EnvFilter` directive, e.g. `info` or `expressive=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl LogConfig {
    #[must_use]
    pub fn retention_files(&self) -> usize {
        if self.env.is_prod() {
            PROD_RETENTION_FILES
        } else {
            DEFAULT_RETENTION_FILES
        }
    }
}

/// Keeps the non-blocking file writer running.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Assemble the subscriber without installing it.
///
/// Useful with `tracing::subscriber::with_default` for scoped logging.
pub fn build_subscriber(config: &LogConfig) -> Result<(impl Subscriber + Send + Sync, LogGuard)> {
    std::fs::create_dir_all(&config.directory).with_context(|| {
        format!("Failed to create log directory {}", config.directory.display())
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.name.as_str())
        .filename_suffix("log")
        .max_log_files(config.retention_files())
        .build(&config.directory)
        .context("Failed to create rolling log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("Invalid log level directive '{}'", config.level))?;

    let file_layer = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(writer)
            .boxed(),
    };
    let console_layer = config
        .env
        .is_dev()
        .then(|| fmt::layer().with_target(false).boxed());

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer);

    Ok((subscriber, LogGuard { _file: guard }))
}

/// Install the logger globally.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard> {
    let (subscriber, guard) = build_subscriber(config)?;
    subscriber
        .try_init()
        .context("Failed to initialize logging")?;
    tracing::debug!(
        name = %config.name,
        directory = %config.directory.display(),
        env = %config.env,
        retention_files = config.retention_files(),
        "Logging initialized"
    );
    Ok(guard)
}

/// Console-only subscriber, for tools and tests that have no log directory.
pub fn console_subscriber(level: &str) -> impl Subscriber + Send + Sync {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
}
