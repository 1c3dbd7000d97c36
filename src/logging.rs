use thiserror::Error;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "assessment-analytics";
const RETAINED_LOG_FILES: usize = 30;

/// Caps applied under a bare level. sled and hyper log per page and per connection at debug.
const QUIET_TARGETS: [&str; 2] = ["sled=warn", "hyper=warn"];

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log directory {dir}: {source}")]
    Appender {
        dir: String,
        #[source]
        source: InitError,
    },
    #[error("cannot install tracing subscriber: {0}")]
    Subscriber(String),
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// Filter directives for a configured level. A bare level such as `debug` gets the dependency
/// caps appended; a value that already names targets is used as written.
pub fn filter_directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    std::iter::once(level)
        .chain(QUIET_TARGETS)
        .collect::<Vec<_>>()
        .join(",")
}

/// Daily-rotated file writer under `log_dir`. Creates the directory when missing.
pub fn file_appender(config: &LogConfig) -> Result<RollingFileAppender, LoggingError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(RETAINED_LOG_FILES)
        .build(&config.log_dir)
        .map_err(|source| LoggingError::Appender {
            dir: config.log_dir.clone(),
            source,
        })
}

/// Install the global subscriber: human-readable stdout plus optional daily JSON files.
///
/// Returns `Ok(false)` when a subscriber is already installed, which happens when several tests
/// share one process. An unparsable level falls back to `info` and is reported once logging is up.
pub fn init_tracing(config: &LogConfig) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let (env_filter, rejected) = match EnvFilter::try_new(filter_directives(&config.log_level)) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(filter_directives("info")), Some(e.to_string())),
    };

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let file_layer = if config.enable_file_logs {
        Some(
            fmt::layer()
                .with_writer(file_appender(config)?)
                .with_ansi(false)
                .json(),
        )
    } else {
        None
    };

    Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Subscriber(e.to_string()))?;

    if let Some(reason) = rejected {
        tracing::warn!(log_level = %config.log_level, %reason, "Invalid log level, using info");
    }
    Ok(true)
}
