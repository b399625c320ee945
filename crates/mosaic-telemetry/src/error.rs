//! Telemetry error types.

use thiserror::Error;

/// Why logging could not be configured or installed.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Not one of `pretty`, `compact`, `json` or `full`.
    #[error("unknown log format '{0}'")]
    UnknownFormat(String),

    /// The level or a directive is not a valid filter.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// The rolling-file directory could not be created.
    #[error("cannot create log directory {path}: {source}")]
    LogDirectory {
        /// Requested directory.
        path: String,
        /// I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
