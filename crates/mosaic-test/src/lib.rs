//! Mosaic Test - Shared test utilities for the Mosaic application host.
//!
//! This crate provides mock collaborators and a [`TestHost`] harness that
//! wires them into a ready [`mosaic_apps::AppLoader`].
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! mosaic-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use mosaic_test::{TestHost, test_module};
//!
//! #[tokio::test]
//! async fn test_load() {
//!     let host = TestHost::builder()
//!         .with_module("apps/voip/app", test_module())
//!         .build();
//!
//!     let app = host.loader.load("voip").await.unwrap();
//!     assert_eq!(app.name(), "voip");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;
pub mod recorder;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
pub use recorder::*;
