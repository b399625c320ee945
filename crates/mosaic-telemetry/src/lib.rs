//! Mosaic Telemetry - Logging and request tracing for the Mosaic host.
//!
//! This crate provides:
//! - Configurable `tracing` subscriber setup with multiple formats and targets
//! - Request context for correlating gateway calls and asset fetches
//!
//! # Example
//!
//! ```rust,no_run
//! use mosaic_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), mosaic_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("mosaic_gateway=trace");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("gateway").with_operation("account.update");
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("Dispatching call");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
