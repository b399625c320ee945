//! Global upload progress indicator state.
//!
//! Upload calls take a [`ProgressTicket`] from the tracker before they are
//! sent. The ticket owns the call's slot: the transport's progress stream
//! updates the slot's bar, and dropping the ticket (after the transport
//! resolves, on success or error) removes it. Counters only ever move
//! through a live slot, so they cannot underflow.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use mosaic_events::{EventBus, topics};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::transport::{ProgressCallback, ProgressEvent};

/// Bars are held here until the transport's terminal callback fires.
const COMPLETION_HOLD_PERCENT: u8 = 99;

/// Identifier of one tracked upload call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgressId(Uuid);

impl ProgressId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ProgressId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "progress_{}", self.0.simple())
    }
}

/// Point-in-time view of the indicator, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Bars currently below completion.
    pub active_count: usize,
    /// Upload calls that have not resolved yet.
    pub running_call_count: usize,
    /// Whether the indicator container is shown.
    pub visible: bool,
    /// Percentage of each visible bar, keyed by call id.
    pub bars: BTreeMap<String, u8>,
}

#[derive(Debug, Default)]
struct CallSlot {
    bar: Option<u8>,
    below_complete: bool,
}

#[derive(Debug, Default)]
struct TrackerState {
    active_count: usize,
    running_call_count: usize,
    visible: bool,
    calls: HashMap<ProgressId, CallSlot>,
}

impl TrackerState {
    fn settle_visibility(&mut self) {
        if self.active_count == 0 && self.running_call_count == 0 {
            self.visible = false;
        }
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            active_count: self.active_count,
            running_call_count: self.running_call_count,
            visible: self.visible,
            bars: self
                .calls
                .iter()
                .filter_map(|(id, slot)| slot.bar.map(|bar| (id.to_string(), bar)))
                .collect(),
        }
    }
}

/// Shared upload progress state.
#[derive(Debug)]
pub struct UploadProgressTracker {
    state: Mutex<TrackerState>,
    bus: EventBus,
}

impl UploadProgressTracker {
    /// Create a tracker that publishes snapshots on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            bus,
        }
    }

    /// Start tracking one upload call.
    #[must_use]
    pub fn begin(self: &Arc<Self>) -> ProgressTicket {
        let id = ProgressId::new();
        let snapshot = self.update(|state| {
            state.calls.insert(id, CallSlot::default());
            state.running_call_count = state.running_call_count.saturating_add(1);
        });
        debug!(progress_id = %id, running = snapshot.running_call_count, "Upload tracking started");
        self.publish(&snapshot);

        ProgressTicket {
            id,
            tracker: Arc::clone(self),
        }
    }

    /// Apply a progress event to the call `id`.
    ///
    /// Events with an unknown total and events for calls that already
    /// finished are ignored.
    pub fn report(&self, id: ProgressId, event: ProgressEvent) {
        let Some(percent) = percent_of(event) else {
            trace!(progress_id = %id, "Ignoring non-computable progress event");
            return;
        };

        let mut changed = false;
        let snapshot = self.update(|state| {
            let Some(slot) = state.calls.get_mut(&id) else {
                return;
            };

            if percent >= 100 {
                if slot.bar.is_some() && slot.below_complete {
                    slot.bar = Some(COMPLETION_HOLD_PERCENT);
                    slot.below_complete = false;
                    state.active_count = state.active_count.saturating_sub(1);
                    changed = true;
                }
            } else {
                if slot.bar.is_none() {
                    slot.below_complete = true;
                    state.active_count = state.active_count.saturating_add(1);
                }
                slot.bar = Some(percent);
                state.visible = true;
                changed = true;
            }
            state.settle_visibility();
        });

        if changed {
            self.publish(&snapshot);
        }
    }

    /// Stop tracking the call `id`. Idempotent.
    pub fn finish(&self, id: ProgressId) {
        let mut removed = false;
        let snapshot = self.update(|state| {
            let Some(slot) = state.calls.remove(&id) else {
                return;
            };
            removed = true;
            state.running_call_count = state.running_call_count.saturating_sub(1);
            if slot.below_complete {
                state.active_count = state.active_count.saturating_sub(1);
            }
            state.settle_visibility();
        });

        if removed {
            debug!(progress_id = %id, running = snapshot.running_call_count, "Upload tracking finished");
            self.publish(&snapshot);
        }
    }

    /// Current indicator state.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot()
    }

    fn update(&self, f: impl FnOnce(&mut TrackerState)) -> ProgressSnapshot {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
        state.snapshot()
    }

    fn publish(&self, snapshot: &ProgressSnapshot) {
        match serde_json::to_value(snapshot) {
            Ok(payload) => {
                self.bus.publish(topics::UPLOAD_PROGRESS_CHANGED, payload);
            },
            Err(e) => debug!(error = %e, "Failed to serialize progress snapshot"),
        }
    }
}

fn percent_of(event: ProgressEvent) -> Option<u8> {
    let total = event.total.filter(|t| *t > 0)?;
    let percent = event.loaded.saturating_mul(100).checked_div(total)?;
    Some(u8::try_from(percent.min(100)).unwrap_or(100))
}

/// Ownership of one tracked upload call. Dropping it finishes the call.
#[derive(Debug)]
pub struct ProgressTicket {
    id: ProgressId,
    tracker: Arc<UploadProgressTracker>,
}

impl ProgressTicket {
    /// The tracked call's id.
    #[must_use]
    pub fn id(&self) -> ProgressId {
        self.id
    }

    /// A transport progress callback feeding this call's bar.
    #[must_use]
    pub fn callback(&self) -> ProgressCallback {
        let tracker = Arc::clone(&self.tracker);
        let id = self.id;
        Arc::new(move |event| tracker.report(id, event))
    }
}

impl Drop for ProgressTicket {
    fn drop(&mut self) {
        self.tracker.finish(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> Arc<UploadProgressTracker> {
        Arc::new(UploadProgressTracker::new(EventBus::new()))
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(ProgressEvent::computable(50, 200)), Some(25));
        assert_eq!(percent_of(ProgressEvent::computable(300, 200)), Some(100));
        assert_eq!(percent_of(ProgressEvent::computable(1, 0)), None);
        assert_eq!(percent_of(ProgressEvent::indeterminate(10)), None);
    }

    #[test]
    fn test_single_upload_lifecycle() {
        let tracker = tracker();
        let ticket = tracker.begin();
        let progress = ticket.callback();

        let snap = tracker.snapshot();
        assert_eq!(snap.running_call_count, 1);
        assert_eq!(snap.active_count, 0);
        assert!(!snap.visible);

        progress(ProgressEvent::computable(40, 100));
        let snap = tracker.snapshot();
        assert_eq!(snap.active_count, 1);
        assert!(snap.visible);
        assert_eq!(snap.bars.values().copied().collect::<Vec<_>>(), vec![40]);

        progress(ProgressEvent::computable(100, 100));
        let snap = tracker.snapshot();
        assert_eq!(snap.active_count, 0);
        assert_eq!(snap.bars.values().copied().collect::<Vec<_>>(), vec![99]);
        assert!(snap.visible, "still running until the call resolves");

        drop(ticket);
        let snap = tracker.snapshot();
        assert_eq!(snap, ProgressSnapshot::default());
    }

    #[test]
    fn test_indeterminate_events_ignored() {
        let tracker = tracker();
        let ticket = tracker.begin();
        ticket.callback()(ProgressEvent::indeterminate(10));
        assert!(tracker.snapshot().bars.is_empty());
        assert!(!tracker.snapshot().visible);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let tracker = tracker();
        let ticket = tracker.begin();
        let id = ticket.id();
        ticket.callback()(ProgressEvent::computable(10, 100));

        tracker.finish(id);
        tracker.finish(id);
        drop(ticket);

        let snap = tracker.snapshot();
        assert_eq!(snap.running_call_count, 0);
        assert_eq!(snap.active_count, 0);
    }

    #[test]
    fn test_late_progress_after_finish_ignored() {
        let tracker = tracker();
        let ticket = tracker.begin();
        let progress = ticket.callback();
        drop(ticket);

        progress(ProgressEvent::computable(10, 100));
        assert_eq!(tracker.snapshot(), ProgressSnapshot::default());
    }

    #[test]
    fn test_two_uploads_hide_only_when_both_done() {
        let tracker = tracker();
        let first = tracker.begin();
        let second = tracker.begin();
        first.callback()(ProgressEvent::computable(10, 100));
        second.callback()(ProgressEvent::computable(20, 100));
        assert_eq!(tracker.snapshot().running_call_count, 2);
        assert_eq!(tracker.snapshot().active_count, 2);

        drop(first);
        let snap = tracker.snapshot();
        assert_eq!(snap.running_call_count, 1);
        assert!(snap.visible);

        drop(second);
        let snap = tracker.snapshot();
        assert_eq!(snap.running_call_count, 0);
        assert!(!snap.visible);
    }

    #[test]
    fn test_changes_published() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_topic(topics::UPLOAD_PROGRESS_CHANGED);
        let tracker = Arc::new(UploadProgressTracker::new(bus));

        let ticket = tracker.begin();
        ticket.callback()(ProgressEvent::computable(5, 10));
        drop(ticket);

        let events = rx.drain();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].payload["active_count"], 1);
        assert_eq!(events[2].payload["visible"], false);
    }
}
