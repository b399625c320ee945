//! Prelude module - commonly used types for convenient import.
//!
//! Use `use mosaic_telemetry::prelude::*;` to import all essential types.

// Logging setup
pub use crate::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};

// Request context
pub use crate::{RequestContext, RequestGuard};

// Errors
pub use crate::{TelemetryError, TelemetryResult};
