//! Synchronous capture of bus events.

use std::sync::{Arc, Mutex, PoisonError};

use mosaic_events::{EventBus, SubscriberId};
use serde_json::Value;

/// Owner name the recorder registers under.
pub const RECORDER_OWNER: &str = "mosaic-test-recorder";

/// Records every event published on a bus, in order.
///
/// Uses a synchronous handler, so events are visible as soon as
/// `publish` returns.
#[derive(Debug)]
pub struct EventRecorder {
    bus: EventBus,
    id: SubscriberId,
    events: Arc<Mutex<Vec<(String, Value)>>>,
}

impl EventRecorder {
    /// Start recording `bus`.
    #[must_use]
    pub fn attach(bus: &EventBus) -> Self {
        let events: Arc<Mutex<Vec<(String, Value)>>> = Arc::default();
        let sink = Arc::clone(&events);
        let id = bus.on(
            "*",
            RECORDER_OWNER,
            Arc::new(move |event| {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((event.topic.clone(), event.payload.clone()));
            }),
        );
        Self {
            bus: bus.clone(),
            id,
            events,
        }
    }

    /// Every recorded `(topic, payload)` pair.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Value)> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded topics, in order.
    #[must_use]
    pub fn topics(&self) -> Vec<String> {
        self.events().into_iter().map(|(topic, _)| topic).collect()
    }

    /// Payloads published on `topic`, in order.
    #[must_use]
    pub fn payloads(&self, topic: &str) -> Vec<Value> {
        self.events()
            .into_iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| payload)
            .collect()
    }

    /// How many events were published on `topic`.
    #[must_use]
    pub fn count(&self, topic: &str) -> usize {
        self.payloads(topic).len()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Drop for EventRecorder {
    fn drop(&mut self) {
        self.bus.off(self.id);
    }
}
