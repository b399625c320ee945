//! Mosaic Apps - application loading for the Mosaic application host.
//!
//! This crate provides:
//! - [`AppLoader`]: idempotent, concurrency-safe application loading
//! - [`ApplicationRegistry`]: which applications are ready or loading
//! - Sequential sub-module composition and best-effort dependency loading
//! - [`LocaleStore`]: per-application translation bundles
//! - [`PermissionFilter`]: extension visibility per user
//!
//! Module code and assets come from host-supplied [`ModuleResolver`] and
//! [`AssetFetcher`] implementations; outbound calls go through the
//! application's scoped [`mosaic_gateway::ApiGateway`] handle.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod application;
pub mod assets;
pub mod context;
pub mod error;
pub mod flags;
pub mod loader;
pub mod locale;
pub mod module;
pub mod permission;
pub mod registry;
pub mod resolver;
pub mod state;

mod composer;

pub use application::Application;
pub use assets::{AssetFetcher, ModuleLocation, ModuleResolver, join_path, with_trailing_slash};
pub use context::HostContext;
pub use error::{AppError, AppResult, AssetError, Degradation};
pub use flags::{FlagScope, UiFlags};
pub use loader::{AppLoader, LoadOptions, PRO_SUB_MODULE, SHORTCUT_CATEGORY};
pub use locale::LocaleStore;
pub use module::{HandlerRef, LanguageSupport, ModuleDefinition, OnLoad};
pub use permission::PermissionFilter;
pub use registry::{ActiveApp, ApplicationRegistry};
pub use resolver::{
    Dependency, DependencyKind, ExtensionLoader, FailedDependency, ResolutionReport, SkipReason,
    SkippedDependency,
};
pub use state::AppState;
