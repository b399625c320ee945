//! Errors raised while loading host configuration.

use std::io;
use thiserror::Error;

/// Why a configuration layer could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadError {
        /// Layer path.
        path: String,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A layer exceeds the file size cap.
    #[error("{path} is {size} bytes, over the {limit} byte limit")]
    FileTooLarge {
        /// Layer path.
        path: String,
        /// Actual size.
        size: u64,
        /// Allowed size.
        limit: u64,
    },

    /// A layer, or the merged tree, is not valid host configuration TOML.
    #[error("malformed configuration in {path}: {source}")]
    ParseError {
        /// Layer path, or a `<...>` label for the embedded and merged trees.
        path: String,
        /// TOML failure.
        #[source]
        source: toml::de::Error,
    },

    /// A merged value is out of range.
    #[error("invalid {field}: {message}")]
    ValidationError {
        /// Dotted field path, e.g. `api.default_url`.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The user layer was requested but no home directory is known.
    #[error("no home directory for the user configuration layer")]
    NoHomeDir,
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
