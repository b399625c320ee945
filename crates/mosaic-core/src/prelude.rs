//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers
pub use crate::{Principal, ResourceId, normalize_language};

// Catalog
pub use crate::{AllowedUsers, AppCatalog, ExtensionDescriptor};

// Session
pub use crate::{AuthSession, AuthState, InstalledApp, MemorySessionStore, SessionStore};

// JSON helpers
pub use crate::{deep_merge, deep_merged};
