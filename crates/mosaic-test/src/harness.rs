//! Test harness helpers.

use std::path::PathBuf;
use std::sync::Arc;

use mosaic_apps::{AppLoader, HostContext, ModuleDefinition};
use mosaic_config::Config;
use mosaic_core::{AppCatalog, AuthSession, AuthState, MemorySessionStore};
use mosaic_events::EventBus;
use mosaic_gateway::ApiGateway;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use crate::mocks::{MockAssetFetcher, MockModuleResolver, MockTransport};

/// Set up test logging with the given filter.
///
/// Later calls are ignored, so every test may call it.
pub fn setup_test_logging(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Set up test logging with default filter (warn level).
pub fn setup_test_logging_default() {
    setup_test_logging("warn");
}

/// Create a temporary directory for testing.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created.
#[must_use]
pub fn test_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Create a file within a temporary directory, creating parents as needed.
///
/// # Panics
///
/// Panics if the file cannot be created or written.
#[must_use]
pub fn test_file_in_dir(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    std::fs::write(&path, content).expect("Failed to write file");
    path
}

/// A fully wired host backed by mocks.
#[derive(Debug)]
pub struct TestHost {
    /// The loader under test.
    pub loader: AppLoader,
    /// The gateway every application calls through.
    pub gateway: Arc<ApiGateway>,
    /// Transport behind the gateway.
    pub transport: Arc<MockTransport>,
    /// Module resolver behind the loader.
    pub resolver: Arc<MockModuleResolver>,
    /// Asset fetcher behind the loader.
    pub assets: Arc<MockAssetFetcher>,
    /// Persisted session store.
    pub session_store: Arc<MemorySessionStore>,
}

impl TestHost {
    /// Start building a host.
    #[must_use]
    pub fn builder() -> TestHostBuilder {
        TestHostBuilder::default()
    }

    /// The shared event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        self.gateway.bus()
    }

    /// The shared auth session.
    #[must_use]
    pub fn session(&self) -> &Arc<AuthSession> {
        self.gateway.session()
    }
}

/// Builder for [`TestHost`].
#[derive(Debug, Default)]
pub struct TestHostBuilder {
    config: Config,
    catalog: AppCatalog,
    auth: AuthState,
    resolver: MockModuleResolver,
    assets: MockAssetFetcher,
    transport: MockTransport,
    session_store: MemorySessionStore,
}

impl TestHostBuilder {
    /// Use `config` for the loader and the gateway.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use `catalog` as the application directory.
    #[must_use]
    pub fn with_catalog(mut self, catalog: AppCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Start logged in with `auth`.
    #[must_use]
    pub fn with_auth(mut self, auth: AuthState) -> Self {
        self.auth = auth;
        self
    }

    /// Serve `definition` at module path `path`.
    #[must_use]
    pub fn with_module(mut self, path: &str, definition: ModuleDefinition) -> Self {
        self.resolver = self.resolver.with_module(path, definition);
        self
    }

    /// Use `resolver`.
    #[must_use]
    pub fn with_resolver(mut self, resolver: MockModuleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Use `assets`.
    #[must_use]
    pub fn with_assets(mut self, assets: MockAssetFetcher) -> Self {
        self.assets = assets;
        self
    }

    /// Use `transport`.
    #[must_use]
    pub fn with_transport(mut self, transport: MockTransport) -> Self {
        self.transport = transport;
        self
    }

    /// Use `store` as the persisted session.
    #[must_use]
    pub fn with_session_store(mut self, store: MemorySessionStore) -> Self {
        self.session_store = store;
        self
    }

    /// Wire everything together.
    ///
    /// # Panics
    ///
    /// Panics if the gateway rejects the configuration's hook table.
    #[must_use]
    pub fn build(self) -> TestHost {
        setup_test_logging_default();

        let transport = Arc::new(self.transport);
        let resolver = Arc::new(self.resolver);
        let assets = Arc::new(self.assets);
        let session_store = Arc::new(self.session_store);

        let gateway = Arc::new(
            ApiGateway::builder(Arc::clone(&transport) as _)
                .with_config(&self.config)
                .with_session(Arc::new(AuthSession::new(self.auth)))
                .with_session_store(Arc::clone(&session_store) as _)
                .build()
                .expect("Failed to build test gateway"),
        );

        let context = HostContext::new(
            Arc::clone(&gateway),
            Arc::clone(&resolver) as _,
            Arc::clone(&assets) as _,
        )
        .with_config(self.config)
        .with_catalog(self.catalog);

        TestHost {
            loader: AppLoader::new(context),
            gateway,
            transport,
            resolver,
            assets,
            session_store,
        }
    }
}
