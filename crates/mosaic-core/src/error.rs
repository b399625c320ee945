//! Error types for core Mosaic operations.

use thiserror::Error;

/// Errors raised while parsing or validating core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A resource identifier was not of the form `<module>.<method>`.
    #[error("invalid resource id '{0}': expected '<module>.<method>'")]
    InvalidResourceId(String),

    /// The application catalog could not be parsed.
    #[error("invalid application catalog: {0}")]
    InvalidCatalog(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
