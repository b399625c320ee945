//! Application loading errors and absorbed degradations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::AppState;

/// A collaborator failed to fetch an asset or resolve a module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct AssetError {
    /// What was being fetched.
    pub location: String,
    /// Why it failed.
    pub message: String,
}

impl AssetError {
    /// Create an asset error.
    #[must_use]
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

/// Fatal application load errors.
///
/// `Clone` so every caller joined on an in-flight load receives the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// The application's module, or one of its sub-modules, could not be
    /// resolved.
    #[error("failed to resolve module for '{app}' at {location}: {message}")]
    ModuleResolution {
        /// Application being loaded.
        app: String,
        /// Module location that failed.
        location: String,
        /// Resolver error.
        message: String,
    },

    /// A subscription names a method the application does not define.
    #[error("application '{app}' subscribes '{topic}' to unknown method '{method}'")]
    UnknownHandler {
        /// Application being loaded.
        app: String,
        /// Subscribed topic.
        topic: String,
        /// Missing method name.
        method: String,
    },

    /// A lifecycle transition skipped a state or went backwards.
    #[error("invalid lifecycle transition {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: AppState,
        /// Requested state.
        to: AppState,
    },
}

impl AppError {
    pub(crate) fn module_resolution(app: &str, err: AssetError) -> Self {
        Self::ModuleResolution {
            app: app.to_string(),
            location: err.location,
            message: err.message,
        }
    }
}

/// Result type for application loading.
pub type AppResult<T> = Result<T, AppError>;

/// A non-fatal failure absorbed while loading an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// The build configuration could not be fetched; `{}` was used.
    ConfigUnavailable {
        /// Why the fetch failed.
        reason: String,
    },
    /// The application does not support a requested language.
    LocaleUnavailable {
        /// The unsupported language tag.
        language: String,
    },
    /// An external script or extension failed to load.
    DependencyFailed {
        /// The dependency that failed.
        dependency: String,
        /// Why it failed.
        reason: String,
    },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigUnavailable { reason } => write!(f, "build config unavailable: {reason}"),
            Self::LocaleUnavailable { language } => write!(f, "language {language} unsupported"),
            Self::DependencyFailed { dependency, reason } => {
                write!(f, "dependency {dependency} failed: {reason}")
            },
        }
    }
}
