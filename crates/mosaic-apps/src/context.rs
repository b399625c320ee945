//! Shared collaborators of the application host.

use std::fmt;
use std::sync::Arc;

use mosaic_config::Config;
use mosaic_core::{AppCatalog, AuthSession};
use mosaic_events::EventBus;
use mosaic_gateway::ApiGateway;

use crate::assets::{AssetFetcher, ModuleResolver};

/// Everything an [`AppLoader`](crate::AppLoader) needs from the host.
///
/// The bus and session are the gateway's, so applications, hooks and the
/// loader all observe the same state.
#[derive(Clone)]
pub struct HostContext {
    config: Arc<Config>,
    catalog: Arc<AppCatalog>,
    gateway: Arc<ApiGateway>,
    resolver: Arc<dyn ModuleResolver>,
    assets: Arc<dyn AssetFetcher>,
}

impl HostContext {
    /// Assemble a context with the default configuration and an empty
    /// catalog.
    #[must_use]
    pub fn new(
        gateway: Arc<ApiGateway>,
        resolver: Arc<dyn ModuleResolver>,
        assets: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self {
            config: Arc::new(Config::default()),
            catalog: Arc::new(AppCatalog::new()),
            gateway,
            resolver,
            assets,
        }
    }

    /// Use `config`.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Use `catalog` as the application directory.
    #[must_use]
    pub fn with_catalog(mut self, catalog: AppCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Host configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Application directory.
    #[must_use]
    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// The API gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    /// The event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        self.gateway.bus()
    }

    /// The authenticated session.
    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        self.gateway.session()
    }

    /// Module code resolver.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn ModuleResolver> {
        &self.resolver
    }

    /// Asset fetcher.
    #[must_use]
    pub fn assets(&self) -> &Arc<dyn AssetFetcher> {
        &self.assets
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("catalog_entries", &self.catalog.len())
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}
