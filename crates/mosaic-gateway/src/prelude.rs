//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_gateway::prelude::*;` to import all essential types.

pub use crate::{GatewayError, GatewayResult, TransportError};

pub use crate::{ApiGateway, GatewayBuilder, GatewaySettings, ScopedGateway};

pub use crate::{HookKind, HookTable, RequestIntent};

pub use crate::{ApiRequest, ApiResponse, ProgressEvent, ResourceCatalog, Transport};

pub use crate::{ProgressSnapshot, UploadProgressTracker, WhitelabelState};
