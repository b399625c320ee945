//! Event bus for broadcasting host events.

use std::sync::Arc;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::event::HostEvent;
use crate::subscriber::{EventHandler, SubscriberId, SubscriberRegistry, topic_matches};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Event bus for broadcasting events to all subscribers.
///
/// Async receivers get every event through a broadcast channel; synchronous
/// handlers registered with [`EventBus::on`] run inline during `publish`.
///
/// **WARNING:** The handler registry is shared across clones. A handler that
/// captures a cloned `EventBus` creates an `Arc` reference cycle; capture a
/// `std::sync::Weak` or a channel instead.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<Arc<HostEvent>>,
    registry: Arc<SubscriberRegistry>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            registry: Arc::new(SubscriberRegistry::new()),
            capacity,
        }
    }

    /// Publish `payload` under `topic`.
    ///
    /// Returns the number of async receivers that received the event.
    pub fn publish(&self, topic: impl Into<String>, payload: Value) -> usize {
        self.publish_event(HostEvent::new(topic, payload))
    }

    /// Publish a fully formed event.
    ///
    /// Broadcasts to async receivers first, then runs matching synchronous
    /// handlers. Returns the number of async receivers.
    pub fn publish_event(&self, event: HostEvent) -> usize {
        let event = Arc::new(event);

        trace!(topic = %event.topic, "Publishing event");

        let count = if let Ok(c) = self.sender.send(Arc::clone(&event)) {
            debug!(topic = %event.topic, receiver_count = c, "Event published");
            c
        } else {
            trace!(topic = %event.topic, "No receivers for event");
            0
        };

        self.registry.notify(&event);

        count
    }

    /// Register a synchronous handler for `topic` on behalf of `owner`.
    ///
    /// `topic` may contain `*` segments (see [`topic_matches`]).
    pub fn on(
        &self,
        topic: impl Into<String>,
        owner: impl Into<String>,
        handler: EventHandler,
    ) -> SubscriberId {
        self.registry.register(topic, owner, handler)
    }

    /// Remove a synchronous handler. Returns `true` if it existed.
    pub fn off(&self, id: SubscriberId) -> bool {
        self.registry.unregister(id)
    }

    /// Remove every synchronous handler registered by `owner`.
    pub fn off_owner(&self, owner: &str) -> usize {
        self.registry.unregister_owner(owner)
    }

    /// Subscribe to every event.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe to events whose topic matches `topic_pattern`.
    #[must_use]
    pub fn subscribe_topic(&self, topic_pattern: impl Into<String>) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(topic_pattern.into()))
    }

    /// Get the synchronous handler registry.
    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Current number of subscribers (async receivers plus handlers).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .receiver_count()
            .saturating_add(self.registry.len())
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            registry: Arc::clone(&self.registry),
            capacity: self.capacity,
        }
    }
}

/// Receiver for events from the event bus.
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<HostEvent>>,
    topic_pattern: Option<String>,
}

impl EventReceiver {
    fn new(receiver: broadcast::Receiver<Arc<HostEvent>>, topic_pattern: Option<String>) -> Self {
        Self {
            receiver,
            topic_pattern,
        }
    }

    fn matches(&self, event: &HostEvent) -> bool {
        self.topic_pattern
            .as_deref()
            .is_none_or(|pattern| topic_matches(&event.topic, pattern))
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once the channel is closed. Lagged events are logged
    /// and skipped.
    pub async fn recv(&mut self) -> Option<Arc<HostEvent>> {
        let mut skipped: usize = 0;
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                    skipped = skipped.wrapping_add(1);
                    if skipped.is_multiple_of(100) {
                        tokio::task::yield_now().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    pub fn try_recv(&mut self) -> Option<Arc<HostEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }

    /// Drain every matching event currently queued.
    pub fn drain(&mut self) -> Vec<Arc<HostEvent>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(topics::APP_READY, json!({"app": "voip"}));
        assert_eq!(count, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.topic, topics::APP_READY);
        assert_eq!(event.payload["app"], "voip");
    }

    #[tokio::test]
    async fn test_subscribe_topic_filters() {
        let bus = EventBus::new();
        let mut auth = bus.subscribe_topic("auth.*");

        bus.publish(topics::REQUEST_START, json!({}));
        bus.publish(topics::CURRENT_USER_UPDATED, json!({"id": "u1"}));

        let event = auth.recv().await.unwrap();
        assert_eq!(event.topic, topics::CURRENT_USER_UPDATED);
        assert!(auth.try_recv().is_none());
    }

    #[test]
    fn test_on_and_off() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);

        let id = bus.on(
            "voip.refresh",
            "voip",
            Arc::new(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish("voip.refresh", json!(null));
        assert!(bus.off(id));
        bus.publish("voip.refresh", json!(null));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_clone_shares_registry() {
        let bus = EventBus::new();
        let clone = bus.clone();
        clone.on("a.b", "owner", Arc::new(|_| {}));
        assert_eq!(bus.registry().len(), 1);
        assert_eq!(bus.off_owner("owner"), 1);
    }

    #[test]
    fn test_drain() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        bus.publish(topics::REQUEST_START, json!({}));
        bus.publish(topics::REQUEST_END, json!({}));

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].topic, topics::REQUEST_END);
    }
}
