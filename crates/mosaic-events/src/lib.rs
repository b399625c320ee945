//! Mosaic Events - Event bus for the Mosaic application host.
//!
//! This crate provides:
//! - The [`HostEvent`] envelope (topic + JSON payload + metadata)
//! - Well-known host topics in [`topics`]
//! - A broadcast-based event bus for async receivers
//! - A topic-keyed subscriber registry for synchronous handlers
//!
//! # Architecture
//!
//! Events are published to an [`EventBus`] under a dot-separated topic.
//! There are two ways to listen:
//!
//! 1. **Async receivers**: `bus.subscribe()` or `bus.subscribe_topic(..)`
//!    return an [`EventReceiver`] that can be polled asynchronously.
//!
//! 2. **Synchronous handlers**: `bus.on(topic, owner, handler)` registers a
//!    callback that runs inline during `publish`. Registrations never
//!    replace each other; two handlers on the same topic both fire.
//!
//! # Example
//!
//! ```rust
//! use mosaic_events::{EventBus, topics};
//! use serde_json::json;
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe_topic("core.*");
//!
//! bus.publish(topics::APP_READY, json!({"app": "voip"}));
//!
//! let event = receiver.recv().await.unwrap();
//! assert_eq!(event.topic, topics::APP_READY);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod topics;

mod bus;
mod event;
mod subscriber;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver};
pub use event::{EventMetadata, HostEvent};
pub use subscriber::{EventHandler, SubscriberId, SubscriberRegistry, topic_matches};
