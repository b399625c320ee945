//! Prelude module - commonly used test utilities.
//!
//! Use `use mosaic_test::prelude::*;` to import all essential types.

pub use crate::{EventRecorder, TestHost, TestHostBuilder};

pub use crate::{MockAssetFetcher, MockModuleResolver, MockTransport};

pub use crate::{setup_test_logging, setup_test_logging_default};

pub use crate::{test_admin, test_catalog, test_module, test_user};
