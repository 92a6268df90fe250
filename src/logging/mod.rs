use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level '{level}': {message}")]
    Filter { level: String, message: String },
    #[error("cannot open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("logging already initialized: {0}")]
    Init(String),
}

pub type Result<T> = std::result::Result<T, LoggingError>;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget<'a> {
    Stderr,
    /// Append to a file; used while the TUI owns the terminal.
    File(&'a Path),
}

/// Filter from `RUST_LOG`, else `default_level`.
pub fn env_filter(default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_level).map_err(|e| LoggingError::Filter {
        level: default_level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global fmt subscriber.
pub fn init(default_level: &str, target: LogTarget<'_>) -> Result<()> {
    let filter = env_filter(default_level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder.compact().with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File {
                    path: path.to_path_buf(),
                    source,
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };

    installed.map_err(|e| LoggingError::Init(e.to_string()))
}
