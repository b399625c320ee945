//! Application lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Where an application is in its load.
///
/// States only move forward, one step at a time. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    /// Not loaded and not loading.
    Unregistered,
    /// Module resolved, build configuration being fetched.
    ConfigPending,
    /// Build configuration known.
    ConfigResolved,
    /// Sub-modules being merged.
    ComposingSubmodules,
    /// External scripts and extensions loading.
    ResolvingDependencies,
    /// Fully loaded.
    Ready,
}

impl AppState {
    /// The state that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Unregistered => Some(Self::ConfigPending),
            Self::ConfigPending => Some(Self::ConfigResolved),
            Self::ConfigResolved => Some(Self::ComposingSubmodules),
            Self::ComposingSubmodules => Some(Self::ResolvingDependencies),
            Self::ResolvingDependencies => Some(Self::Ready),
            Self::Ready => None,
        }
    }

    /// Move to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidTransition`] unless `to` immediately
    /// follows the current state.
    pub fn advance(self, to: Self) -> AppResult<Self> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(AppError::InvalidTransition { from: self, to })
        }
    }

    /// Whether this is the terminal state.
    #[must_use]
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unregistered => "unregistered",
            Self::ConfigPending => "config_pending",
            Self::ConfigResolved => "config_resolved",
            Self::ComposingSubmodules => "composing_submodules",
            Self::ResolvingDependencies => "resolving_dependencies",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let mut state = AppState::Unregistered;
        while let Some(next) = state.next() {
            state = state.advance(next).unwrap();
        }
        assert!(state.is_ready());
    }

    #[test]
    fn test_backward_and_skipping_rejected() {
        assert!(matches!(
            AppState::ConfigResolved.advance(AppState::ConfigPending),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(AppState::Unregistered.advance(AppState::Ready).is_err());
        assert!(AppState::Ready.advance(AppState::Ready).is_err());
    }
}
