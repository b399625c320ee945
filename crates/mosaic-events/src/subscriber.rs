//! Topic-keyed registry of synchronous event handlers.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::HostEvent;

/// A synchronous event handler.
///
/// Handlers run inline during `publish` and should return quickly.
pub type EventHandler = Arc<dyn Fn(&HostEvent) + Send + Sync>;

/// Registration handle for a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscription {
    id: SubscriberId,
    pattern: String,
    owner: String,
    handler: EventHandler,
}

/// Registry of synchronous handlers keyed by topic pattern.
///
/// Registrations are append-only per pattern: registering a second handler
/// for a topic adds a subscription, it never replaces the first one.
/// Handlers fire in registration order.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscriber_count", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for topics matching `pattern` on behalf of `owner`.
    ///
    /// Returns a handle that can be used to unregister the handler.
    pub fn register(
        &self,
        pattern: impl Into<String>,
        owner: impl Into<String>,
        handler: EventHandler,
    ) -> SubscriberId {
        let id = SubscriberId::new();
        let pattern = pattern.into();
        let owner = owner.into();

        debug!(topic = %pattern, owner = %owner, subscriber_id = %id, "Subscriber registered");

        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscription {
                id,
                pattern,
                owner,
                handler,
            });
        id
    }

    /// Unregister a handler.
    ///
    /// Returns `true` if the handler was found and removed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let mut subs = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() != before;

        if removed {
            debug!(subscriber_id = %id, "Subscriber unregistered");
        }

        removed
    }

    /// Unregister every handler registered by `owner`.
    ///
    /// Returns the number of handlers removed.
    pub fn unregister_owner(&self, owner: &str) -> usize {
        let mut subs = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subs.len();
        subs.retain(|s| s.owner != owner);
        let removed = before.saturating_sub(subs.len());

        if removed > 0 {
            debug!(owner = %owner, removed, "Owner subscriptions removed");
        }

        removed
    }

    /// Run every handler whose pattern matches the event's topic.
    ///
    /// Handlers are collected before any of them runs, so a handler may
    /// register or unregister subscriptions without deadlocking. A panicking
    /// handler is logged and does not prevent the others from running.
    ///
    /// Returns the number of handlers invoked.
    pub fn notify(&self, event: &HostEvent) -> usize {
        let matching: Vec<(SubscriberId, String, EventHandler)> = self
            .subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| topic_matches(&event.topic, &s.pattern))
            .map(|s| (s.id, s.owner.clone(), Arc::clone(&s.handler)))
            .collect();

        for (id, owner, handler) in &matching {
            trace!(subscriber_id = %id, owner = %owner, topic = %event.topic, "Notifying subscriber");

            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(event);
            }));

            if let Err(e) = result {
                warn!(
                    subscriber_id = %id,
                    owner = %owner,
                    topic = %event.topic,
                    error = ?e,
                    "Subscriber panicked"
                );
            }
        }

        matching.len()
    }

    /// Number of handlers registered by `owner`.
    #[must_use]
    pub fn count_for_owner(&self, owner: &str) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|s| s.owner == owner)
            .count()
    }

    /// Get the number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all handlers.
    pub fn clear(&self) {
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        debug!("All subscribers cleared");
    }
}

/// Match a dot-separated topic against a pattern.
///
/// A `*` segment in the pattern matches exactly one topic segment; a
/// trailing `*` segment matches one or more remaining segments.
#[must_use]
pub fn topic_matches(topic: &str, pattern: &str) -> bool {
    let topic_parts: Vec<&str> = topic.split('.').collect();
    let pattern_parts: Vec<&str> = pattern.split('.').collect();

    if let Some((&"*", head)) = pattern_parts.split_last()
        && topic_parts.len() > head.len()
    {
        return topic_parts
            .iter()
            .zip(head.iter())
            .all(|(t, p)| *p == "*" || t == p);
    }

    if topic_parts.len() != pattern_parts.len() {
        return false;
    }

    topic_parts
        .iter()
        .zip(pattern_parts.iter())
        .all(|(t, p)| *p == "*" || t == p)
}
