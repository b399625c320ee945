//! Registry of loaded and loading applications.
//!
//! One slot per application name. A slot is either an in-flight load,
//! shared by every caller that asks for the name while it runs, or the
//! ready application.

use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::application::Application;
use crate::error::AppResult;
use crate::state::AppState;

/// An in-flight load, joinable by any number of callers.
pub(crate) type SharedLoad = Shared<BoxFuture<'static, AppResult<Arc<Application>>>>;

enum Slot {
    Loading {
        load: SharedLoad,
        state: watch::Receiver<AppState>,
    },
    Ready(Arc<Application>),
}

/// Outcome of claiming a name.
pub(crate) enum Claim {
    /// Already loaded.
    Ready(Arc<Application>),
    /// Loading; await to join.
    Pending(SharedLoad),
}

/// The pointer to the most recently loaded application.
///
/// Shared with every application so it can answer whether it is active.
#[derive(Debug, Clone, Default)]
pub struct ActiveApp(Arc<RwLock<Option<String>>>);

impl ActiveApp {
    /// Name of the most recently loaded application.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `name` is the most recently loaded application.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            == Some(name)
    }

    fn set(&self, name: &str) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
    }
}

/// Single source of truth for which applications are loaded.
#[derive(Default)]
pub struct ApplicationRegistry {
    slots: DashMap<String, Slot>,
    active: ActiveApp,
}

impl ApplicationRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ready application, join the in-flight load, or start a
    /// new one with `start`.
    ///
    /// `start` only builds the future; nothing runs until it is awaited.
    pub(crate) fn claim(
        &self,
        name: &str,
        start: impl FnOnce(watch::Sender<AppState>) -> BoxFuture<'static, AppResult<Arc<Application>>>,
    ) -> Claim {
        match self.slots.entry(name.to_string()) {
            Entry::Occupied(slot) => match slot.get() {
                Slot::Ready(app) => Claim::Ready(Arc::clone(app)),
                Slot::Loading { load, .. } => {
                    debug!(app = name, "Joining in-flight load");
                    Claim::Pending(load.clone())
                },
            },
            Entry::Vacant(slot) => {
                let (tx, rx) = watch::channel(AppState::Unregistered);
                let load = start(tx).shared();
                slot.insert(Slot::Loading {
                    load: load.clone(),
                    state: rx,
                });
                Claim::Pending(load)
            },
        }
    }

    /// Mark `app` ready.
    pub(crate) fn complete(&self, app: Arc<Application>) {
        info!(app = %app.name(), "Application registered");
        self.slots
            .insert(app.name().to_string(), Slot::Ready(app));
    }

    /// Forget a failed load so a later request retries.
    pub(crate) fn abandon(&self, name: &str) {
        if self.slots.remove(name).is_some() {
            debug!(app = name, "Registry slot cleared");
        }
    }

    pub(crate) fn mark_active(&self, name: &str) {
        self.active.set(name);
    }

    /// The ready application called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Application>> {
        self.slots.get(name).and_then(|slot| match &*slot {
            Slot::Ready(app) => Some(Arc::clone(app)),
            Slot::Loading { .. } => None,
        })
    }

    /// Current lifecycle state of `name`.
    #[must_use]
    pub fn state(&self, name: &str) -> AppState {
        self.slots.get(name).map_or(AppState::Unregistered, |slot| match &*slot {
            Slot::Ready(_) => AppState::Ready,
            Slot::Loading { state, .. } => *state.borrow(),
        })
    }

    /// Whether `name` is ready or loading.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Whether `name` is ready.
    #[must_use]
    pub fn is_ready(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Names of ready applications, sorted.
    #[must_use]
    pub fn ready_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Ready(_)))
            .map(|slot| slot.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Name of the most recently loaded application.
    #[must_use]
    pub fn last_loaded(&self) -> Option<String> {
        self.active.get()
    }

    /// Shared handle to the most recently loaded pointer.
    #[must_use]
    pub fn active(&self) -> &ActiveApp {
        &self.active
    }

    /// Number of slots (ready or loading).
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no application is ready or loading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for ApplicationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationRegistry")
            .field("slot_count", &self.slots.len())
            .field("ready", &self.ready_names())
            .field("last_loaded", &self.last_loaded())
            .finish()
    }
}
