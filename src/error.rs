use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the monitor core and its surfaces
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Proc filesystem is not available at {0}")]
    ProcUnavailable(PathBuf),

    #[error("{path}: {source}")]
    SourceRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: unexpected format")]
    Format(String),

    #[error("No readable symbol map found")]
    SymbolMapNotFound,

    #[error("{path}, line {line}: parse error")]
    SymbolMapParse { path: PathBuf, line: usize },

    #[error("Invalid update period: {0}")]
    InvalidPeriod(f64),

    #[error("Sampler runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for the monitor
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create a format error naming the offending source
    pub fn format<S: Into<String>>(source: S) -> Self {
        MonitorError::Format(source.into())
    }

    pub fn source_read<S: Into<String>>(path: S, source: io::Error) -> Self {
        MonitorError::SourceRead {
            path: path.into(),
            source,
        }
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        MonitorError::Runtime(msg.into())
    }
}
