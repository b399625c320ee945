//! The API gateway.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use mosaic_config::Config;
use mosaic_core::{AuthSession, MemorySessionStore, ResourceId, SessionStore};
use mosaic_events::{EventBus, topics};
use mosaic_telemetry::RequestContext;
use serde_json::json;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::hook::HookTable;
use crate::hooks::{self, AfterOutcome, HookEnv, WhitelabelState};
use crate::intent::RequestIntent;
use crate::progress::UploadProgressTracker;
use crate::settings::GatewaySettings;
use crate::transport::{ApiRequest, ApiResponse, ApiSettings, Transport, UiMetadata};

/// Origin stamped on calls that do not name an application.
pub const DEFAULT_ORIGIN: &str = "host";

/// Mediates every outbound API call.
///
/// Resolves the intent's resource against the transport, runs the
/// resource's hook around the transport call, and merges the host's
/// default settings into the call.
pub struct ApiGateway {
    transport: Arc<dyn Transport>,
    hooks: HookTable,
    settings: GatewaySettings,
    session: Arc<AuthSession>,
    session_store: Arc<dyn SessionStore>,
    bus: EventBus,
    tracker: Arc<UploadProgressTracker>,
    whitelabel: Arc<WhitelabelState>,
}

impl ApiGateway {
    /// Start building a gateway around `transport`.
    #[must_use]
    pub fn builder(transport: Arc<dyn Transport>) -> GatewayBuilder {
        GatewayBuilder::new(transport)
    }

    /// Invoke the call described by `intent`.
    ///
    /// Unsupported resources and vetoed calls fail without touching the
    /// transport, and the returned future is ready on its first poll.
    pub fn invoke(&self, intent: RequestIntent) -> BoxFuture<'_, GatewayResult<ApiResponse>> {
        let context = RequestContext::new(intent.origin.as_deref().unwrap_or(DEFAULT_ORIGIN))
            .with_operation(intent.resource.clone());
        self.dispatch(context, intent)
    }

    /// A handle that stamps `origin` and `api_url` on every call.
    #[must_use]
    pub fn scoped(
        self: &Arc<Self>,
        origin: impl Into<String>,
        api_url: Option<String>,
    ) -> ScopedGateway {
        ScopedGateway {
            gateway: Arc::clone(self),
            origin: origin.into(),
            api_url,
        }
    }

    fn dispatch(
        &self,
        context: RequestContext,
        intent: RequestIntent,
    ) -> BoxFuture<'_, GatewayResult<ApiResponse>> {
        let span = context.span();
        Box::pin(self.run(context, intent).instrument(span))
    }

    async fn run(
        &self,
        context: RequestContext,
        mut intent: RequestIntent,
    ) -> GatewayResult<ApiResponse> {
        let resource = self.resolve(&intent.resource)?;
        let kind = self.hooks.get(&resource);
        let env = self.env();

        let ticket = hooks::before(kind, &resource, &mut intent, &env)?;
        debug!(resource = %resource, hook = %kind, "Dispatching call");

        let bypass = intent.bypass_progress_indicator;
        let request = ApiRequest {
            resource: resource.clone(),
            settings: self.assemble(&intent),
        };

        if !bypass {
            self.bus.publish(
                topics::REQUEST_START,
                json!({ "resource": resource.to_string(), "request_id": context.request_id }),
            );
        }

        let outcome = self.transport.send(request).await;
        drop(ticket);

        if !bypass {
            self.bus.publish(
                topics::REQUEST_END,
                json!({
                    "resource": resource.to_string(),
                    "request_id": context.request_id,
                    "ok": outcome.is_ok(),
                }),
            );
        }

        let response = outcome.map_err(|e| {
            warn!(resource = %resource, status = ?e.status, error = %e, "Call failed");
            GatewayError::Transport(e)
        })?;
        debug!(resource = %resource, elapsed_ms = context.elapsed_ms(), "Call succeeded");

        match hooks::after(kind, &intent, response, &env) {
            AfterOutcome::Done(response) => Ok(response),
            AfterOutcome::FollowUp(next) => {
                info!(resource = %resource, follow_up = %next.resource, "Chaining follow-up call");
                let child = context.child(next.resource.clone());
                self.dispatch(child, next).await
            },
        }
    }

    fn resolve(&self, resource: &str) -> GatewayResult<ResourceId> {
        match ResourceId::parse(resource) {
            Ok(id) if self.transport.supports(&id) => Ok(id),
            _ => {
                error!(resource, "Unsupported resource");
                Err(GatewayError::UnsupportedResource(resource.to_string()))
            },
        }
    }

    fn assemble(&self, intent: &RequestIntent) -> ApiSettings {
        let mut headers = BTreeMap::new();
        if let Some(cluster_id) = &self.settings.cluster_id {
            headers.insert(self.settings.cluster_header.clone(), cluster_id.clone());
        }

        ApiSettings {
            auth_token: intent
                .auth_token
                .clone()
                .or_else(|| self.session.auth_token()),
            api_root: intent
                .api_url
                .clone()
                .unwrap_or_else(|| self.settings.api_root.clone()),
            ui_metadata: UiMetadata {
                version: self.settings.version.clone(),
                ui: self.settings.ui_name.clone(),
                origin: intent
                    .origin
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            },
            headers,
            data: intent.data.clone(),
            accept_charges: self.settings.accept_charges,
            bypass_progress_indicator: intent.bypass_progress_indicator,
            upload_progress: intent.upload_progress.clone(),
        }
    }

    fn env(&self) -> HookEnv<'_> {
        HookEnv {
            settings: &self.settings,
            session: &self.session,
            session_store: self.session_store.as_ref(),
            bus: &self.bus,
            whitelabel: &self.whitelabel,
            tracker: &self.tracker,
        }
    }

    /// Hook table in effect.
    #[must_use]
    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    /// Settings in effect.
    #[must_use]
    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Shared auth session.
    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Persisted session store.
    #[must_use]
    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }

    /// Event bus the gateway publishes on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Upload progress tracker.
    #[must_use]
    pub fn tracker(&self) -> &Arc<UploadProgressTracker> {
        &self.tracker
    }

    /// Whitelabel state.
    #[must_use]
    pub fn whitelabel(&self) -> &Arc<WhitelabelState> {
        &self.whitelabel
    }
}

impl fmt::Debug for ApiGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiGateway")
            .field("hooks", &self.hooks.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiGateway`].
pub struct GatewayBuilder {
    transport: Arc<dyn Transport>,
    hooks: HookTable,
    overrides: BTreeMap<String, String>,
    settings: GatewaySettings,
    session: Option<Arc<AuthSession>>,
    session_store: Option<Arc<dyn SessionStore>>,
    bus: Option<EventBus>,
    tracker: Option<Arc<UploadProgressTracker>>,
    whitelabel: Option<Arc<WhitelabelState>>,
}

impl GatewayBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            hooks: HookTable::standard(),
            overrides: BTreeMap::new(),
            settings: GatewaySettings::default(),
            session: None,
            session_store: None,
            bus: None,
            tracker: None,
            whitelabel: None,
        }
    }

    /// Take settings and hook overrides from configuration.
    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.settings = GatewaySettings::from_config(config);
        self.overrides.clone_from(&config.gateway.hooks);
        self
    }

    /// Replace the settings.
    #[must_use]
    pub fn with_settings(mut self, settings: GatewaySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the base hook table (standard by default).
    #[must_use]
    pub fn with_hooks(mut self, hooks: HookTable) -> Self {
        self.hooks = hooks;
        self
    }

    /// Share an auth session.
    #[must_use]
    pub fn with_session(mut self, session: Arc<AuthSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a persisted session store.
    #[must_use]
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Publish on `bus`.
    #[must_use]
    pub fn with_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Share an upload progress tracker.
    #[must_use]
    pub fn with_tracker(mut self, tracker: Arc<UploadProgressTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Share whitelabel state.
    #[must_use]
    pub fn with_whitelabel(mut self, whitelabel: Arc<WhitelabelState>) -> Self {
        self.whitelabel = Some(whitelabel);
        self
    }

    /// Apply hook overrides, validate the hook table against the
    /// transport and build the gateway.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidHookKind`] for an unknown hook name and
    /// [`GatewayError::UnknownHookResource`] when a hooked resource is not
    /// offered by the transport.
    pub fn build(self) -> GatewayResult<ApiGateway> {
        let hooks = self.hooks.with_overrides(&self.overrides)?;
        hooks.validate(self.transport.as_ref())?;

        let bus = self.bus.unwrap_or_default();
        let tracker = self
            .tracker
            .unwrap_or_else(|| Arc::new(UploadProgressTracker::new(bus.clone())));

        info!(
            hooked_resources = hooks.len(),
            api_root = %self.settings.api_root,
            "API gateway ready"
        );

        Ok(ApiGateway {
            transport: self.transport,
            hooks,
            settings: self.settings,
            session: self.session.unwrap_or_default(),
            session_store: self
                .session_store
                .unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            bus,
            tracker,
            whitelabel: self.whitelabel.unwrap_or_default(),
        })
    }
}

impl fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("hooks", &self.hooks.len())
            .field("overrides", &self.overrides)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Gateway handle bound to one application.
#[derive(Clone)]
pub struct ScopedGateway {
    gateway: Arc<ApiGateway>,
    origin: String,
    api_url: Option<String>,
}

impl ScopedGateway {
    /// Invoke a call as this application.
    ///
    /// The application's name always becomes the call's origin; its API
    /// root applies unless the intent names one.
    pub fn call(&self, mut intent: RequestIntent) -> BoxFuture<'_, GatewayResult<ApiResponse>> {
        intent.origin = Some(self.origin.clone());
        if intent.api_url.is_none() {
            intent.api_url.clone_from(&self.api_url);
        }
        self.gateway.invoke(intent)
    }

    /// The application this handle is bound to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// The application's API root, if it overrides the default.
    #[must_use]
    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }

    /// The session's current auth token.
    #[must_use]
    pub fn auth_token(&self) -> Option<String> {
        self.gateway.session.auth_token()
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }
}

impl fmt::Debug for ScopedGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedGateway")
            .field("origin", &self.origin)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
