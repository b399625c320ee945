//! Applications: mutable while loading, immutable once ready.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use mosaic_events::{EventHandler, SubscriberId};
use mosaic_gateway::{ApiResponse, GatewayResult, RequestIntent, ScopedGateway};
use serde_json::{Map, Value};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{AppResult, Degradation};
use crate::flags::UiFlags;
use crate::locale::LocaleStore;
use crate::module::ModuleDefinition;
use crate::registry::ActiveApp;
use crate::resolver::ResolutionReport;
use crate::state::AppState;

/// An application while it is being loaded.
///
/// Every lifecycle step goes through [`advance`](Self::advance), which also
/// publishes the state to the registry.
pub(crate) struct PendingApplication {
    pub(crate) name: String,
    pub(crate) app_path: String,
    pub(crate) api_url: String,
    pub(crate) module: ModuleDefinition,
    pub(crate) build_config: Value,
    pub(crate) degradations: Vec<Degradation>,
    pub(crate) subscriptions: Vec<SubscriberId>,
    pub(crate) dependencies: ResolutionReport,
    state: AppState,
    state_tx: watch::Sender<AppState>,
}

impl PendingApplication {
    pub(crate) fn new(
        name: &str,
        app_path: String,
        api_url: String,
        state_tx: watch::Sender<AppState>,
    ) -> Self {
        Self {
            name: name.to_string(),
            app_path,
            api_url,
            module: ModuleDefinition::new(),
            build_config: Value::Object(Map::new()),
            degradations: Vec::new(),
            subscriptions: Vec::new(),
            dependencies: ResolutionReport::default(),
            state: AppState::Unregistered,
            state_tx,
        }
    }

    /// Move to `to`, which must be the next state.
    pub(crate) fn advance(&mut self, to: AppState) -> AppResult<()> {
        self.state = self.state.advance(to)?;
        self.state_tx.send_replace(self.state);
        debug!(app = %self.name, state = %self.state, "Lifecycle transition");
        Ok(())
    }

    pub(crate) fn degrade(&mut self, degradation: Degradation) {
        self.degradations.push(degradation);
    }

    /// Finish the load.
    pub(crate) fn into_ready(mut self, parts: ReadyParts) -> AppResult<Application> {
        self.advance(AppState::Ready)?;
        Ok(Application {
            name: self.name,
            app_path: self.app_path,
            api_url: self.api_url,
            build_config: self.build_config,
            module: self.module,
            degradations: self.degradations,
            subscriptions: self.subscriptions,
            dependencies: self.dependencies,
            locales: parts.locales,
            gateway: parts.gateway,
            flags: parts.flags,
            active: parts.active,
        })
    }
}

/// Capabilities injected when an application becomes ready.
pub(crate) struct ReadyParts {
    pub(crate) locales: Arc<LocaleStore>,
    pub(crate) gateway: ScopedGateway,
    pub(crate) flags: UiFlags,
    pub(crate) active: ActiveApp,
}

/// A loaded application.
pub struct Application {
    name: String,
    app_path: String,
    api_url: String,
    build_config: Value,
    module: ModuleDefinition,
    degradations: Vec<Degradation>,
    subscriptions: Vec<SubscriberId>,
    dependencies: ResolutionReport,
    locales: Arc<LocaleStore>,
    gateway: ScopedGateway,
    flags: UiFlags,
    active: ActiveApp,
}

impl Application {
    /// Unique application name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base location of the application's resources.
    #[must_use]
    pub fn app_path(&self) -> &str {
        &self.app_path
    }

    /// API root for this application's calls.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build configuration (`{}` when absent or unavailable).
    #[must_use]
    pub fn build_config(&self) -> &Value {
        &self.build_config
    }

    /// The composed module definition.
    #[must_use]
    pub fn module(&self) -> &ModuleDefinition {
        &self.module
    }

    /// The composed module state.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.module.state
    }

    /// A named method.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&EventHandler> {
        self.module.methods.get(name)
    }

    /// Lifecycle state. Always [`AppState::Ready`].
    #[must_use]
    pub fn state(&self) -> AppState {
        AppState::Ready
    }

    /// Failures absorbed while loading.
    #[must_use]
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// Scripts and extensions loaded, failed or skipped.
    #[must_use]
    pub fn dependencies(&self) -> &ResolutionReport {
        &self.dependencies
    }

    /// Bus subscriptions registered for this application.
    #[must_use]
    pub fn subscriptions(&self) -> &[SubscriberId] {
        &self.subscriptions
    }

    /// Translation bundles.
    #[must_use]
    pub fn locales(&self) -> &Arc<LocaleStore> {
        &self.locales
    }

    /// The active translation bundle.
    #[must_use]
    pub fn i18n(&self) -> Arc<Value> {
        self.locales.active()
    }

    /// Per-user and per-account UI flags.
    #[must_use]
    pub fn flags(&self) -> &UiFlags {
        &self.flags
    }

    /// Gateway handle that stamps this application on every call.
    #[must_use]
    pub fn gateway(&self) -> &ScopedGateway {
        &self.gateway
    }

    /// Issue an API call as this application.
    pub fn call_api(&self, intent: RequestIntent) -> BoxFuture<'_, GatewayResult<ApiResponse>> {
        self.gateway.call(intent)
    }

    /// The session's current auth token.
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.gateway.auth_token()
    }

    /// Whether this is the most recently loaded application.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is(&self.name)
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("app_path", &self.app_path)
            .field("api_url", &self.api_url)
            .field("sub_modules", &self.module.sub_modules)
            .field("degradations", &self.degradations)
            .field("subscription_count", &self.subscriptions.len())
            .finish_non_exhaustive()
    }
}
