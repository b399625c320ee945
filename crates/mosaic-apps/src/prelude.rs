//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_apps::prelude::*;` to import all essential types.

// Errors
pub use crate::{AppError, AppResult, AssetError, Degradation};

// Loading
pub use crate::{AppLoader, AppState, Application, ApplicationRegistry, HostContext, LoadOptions};

// Module definitions
pub use crate::{HandlerRef, ModuleDefinition};

// Collaborators
pub use crate::{AssetFetcher, ModuleLocation, ModuleResolver};

// Locales and flags
pub use crate::{LocaleStore, UiFlags};
