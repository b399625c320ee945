//! Mosaic Core - Foundation types for the Mosaic application host.
//!
//! This crate provides:
//! - Resource identifiers used as gateway dispatch keys
//! - The application/extension catalog and its permission levels
//! - Authentication session state and the persisted session store
//! - JSON deep-merge helpers shared by module composition and locales
//! - Language tag normalization

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod catalog;
pub mod error;
pub mod json;
pub mod session;
pub mod types;

pub use catalog::{AllowedUsers, AppCatalog, ExtensionDescriptor};
pub use error::{CoreError, CoreResult};
pub use json::{deep_merge, deep_merged};
pub use session::{
    AUTH_SESSION_KEY, AuthSession, AuthState, InstalledApp, MemorySessionStore, SessionStore,
};
pub use types::{Principal, ResourceId, normalize_language};
