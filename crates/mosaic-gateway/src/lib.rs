//! Mosaic Gateway - mediated API calls for the Mosaic application host.
//!
//! Every outbound call an application makes goes through [`ApiGateway`]:
//! - the resource id is resolved against the [`Transport`]'s catalog
//! - the resource's [`HookKind`] rewrites, vetoes or instruments the call
//! - host defaults (auth token, API root, UI metadata, cluster header) are
//!   merged into the call settings
//! - request start/end events bracket the transport call
//!
//! Upload calls drive the shared [`UploadProgressTracker`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod gateway;
pub mod hook;
pub mod intent;
pub mod progress;
pub mod settings;
pub mod transport;

mod hooks;

pub use error::{GatewayError, GatewayResult, TransportError};
pub use gateway::{ApiGateway, DEFAULT_ORIGIN, GatewayBuilder, ScopedGateway};
pub use hook::{HookKind, HookTable};
pub use hooks::WhitelabelState;
pub use intent::RequestIntent;
pub use progress::{ProgressId, ProgressSnapshot, ProgressTicket, UploadProgressTracker};
pub use settings::GatewaySettings;
pub use transport::{
    ApiRequest, ApiResponse, ApiSettings, ProgressCallback, ProgressEvent, ResourceCatalog,
    Transport, UiMetadata,
};
