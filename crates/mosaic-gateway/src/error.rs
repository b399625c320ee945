//! Gateway error types.

use serde_json::Value;
use thiserror::Error;

/// Failure reported by the transport for a call that was sent.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct TransportError {
    /// HTTP-like status code, if the call reached the API.
    pub status: Option<u16>,
    /// Human-readable description.
    pub message: String,
    /// Error document returned by the API.
    pub data: Value,
}

impl TransportError {
    /// Create an error with a message and no status.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            data: Value::Null,
        }
    }

    /// Set the status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the error document.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Errors returned by the gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The resource id is malformed or not offered by the transport.
    #[error("unsupported resource: {0}")]
    UnsupportedResource(String),

    /// A hook vetoed the call before it was sent.
    #[error("call to {resource} vetoed: {reason}")]
    Vetoed {
        /// Resource that was called.
        resource: String,
        /// Why the call was vetoed.
        reason: String,
    },

    /// The transport reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A hook table entry names a resource the transport does not offer.
    #[error("hook table entry for unknown resource: {0}")]
    UnknownHookResource(String),

    /// A hook table entry names an unknown hook.
    #[error("unknown hook '{kind}' for resource {resource}")]
    InvalidHookKind {
        /// Resource the entry was for.
        resource: String,
        /// The unrecognized hook name.
        kind: String,
    },
}

impl GatewayError {
    /// Whether the call never reached the transport.
    #[must_use]
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
