//! Shared helpers for integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mosaic_apps::ModuleDefinition;
use mosaic_events::EventHandler;
use mosaic_test::{TestHostBuilder, test_auth_state, test_catalog, test_module, test_user};

/// Counts how often its handlers run.
#[allow(dead_code)]
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

#[allow(dead_code)]
impl Counter {
    /// A bus handler bumping this counter.
    pub fn handler(&self) -> EventHandler {
        let count = Arc::clone(&self.0);
        Arc::new(move |_| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    /// Count one invocation directly.
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    /// Invocations so far.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// A host where `voip` and its three catalog extensions resolve, logged in
/// as the regular test user.
#[allow(dead_code)]
pub fn voip_host(voip: ModuleDefinition) -> TestHostBuilder {
    mosaic_test::TestHost::builder()
        .with_auth(test_auth_state(test_user()))
        .with_catalog(test_catalog())
        .with_module("apps/voip/app", voip)
        .with_module("apps/recorder/app", test_module())
        .with_module("apps/reports/app", test_module())
        .with_module("apps/beta/app", test_module())
}
