//! Application loading.
//!
//! [`AppLoader::load`] drives an application from its name to a ready
//! [`Application`]:
//!
//! 1. locate the module (installed-app and per-call overrides apply)
//! 2. fetch the build configuration, if declared
//! 3. merge sub-modules in order
//! 4. load external scripts and permitted extensions concurrently
//! 5. register subscriptions, request stylesheets, load translations and
//!    inject the application's capabilities
//!
//! Concurrent loads of one name share a single in-flight future.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use mosaic_core::normalize_language;
use mosaic_events::topics;
use serde_json::{Map, Value, json};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::application::{Application, PendingApplication, ReadyParts};
use crate::assets::{ModuleLocation, join_path, with_trailing_slash};
use crate::composer::{SubmoduleComposer, register_subscriptions};
use crate::context::HostContext;
use crate::error::{AppError, AppResult, Degradation};
use crate::flags::UiFlags;
use crate::locale::LocaleStore;
use crate::registry::{ApplicationRegistry, Claim};
use crate::resolver::{DependencyResolver, ExtensionLoader};
use crate::state::AppState;

/// Sub-module appended to `pro` builds.
pub const PRO_SUB_MODULE: &str = "pro";

/// Shortcut category replaced on every load.
pub const SHORTCUT_CATEGORY: &str = "appSpecific";

/// Per-call load overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Load the application's code and assets from here.
    pub source_url: Option<String>,
    /// API root for the application's calls. Wins over every other source.
    pub api_url: Option<String>,
}

impl LoadOptions {
    /// No overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load code and assets from `url`.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Send the application's calls to `url`.
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }
}

struct LoaderInner {
    context: HostContext,
    registry: ApplicationRegistry,
}

/// Loads applications into its registry. Cheap to clone.
#[derive(Clone)]
pub struct AppLoader {
    inner: Arc<LoaderInner>,
}

impl AppLoader {
    /// Create a loader with an empty registry.
    #[must_use]
    pub fn new(context: HostContext) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                context,
                registry: ApplicationRegistry::new(),
            }),
        }
    }

    /// The host collaborators.
    #[must_use]
    pub fn context(&self) -> &HostContext {
        &self.inner.context
    }

    /// Loaded and loading applications.
    #[must_use]
    pub fn registry(&self) -> &ApplicationRegistry {
        &self.inner.registry
    }

    /// Name of the most recently loaded application.
    #[must_use]
    pub fn active_app(&self) -> Option<String> {
        self.inner.registry.last_loaded()
    }

    /// Load `name`, or return it if already loaded.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] if the application's module or one of its
    /// sub-modules cannot be resolved, or a subscription names an unknown
    /// method. The application stays unregistered and a later call retries.
    pub async fn load(&self, name: &str) -> AppResult<Arc<Application>> {
        self.load_with(name, LoadOptions::default()).await
    }

    /// Load `name` with per-call overrides. The overrides are ignored when
    /// the application is already loaded or loading.
    ///
    /// Makes the application the active one and publishes its keyboard
    /// shortcuts.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_with(&self, name: &str, options: LoadOptions) -> AppResult<Arc<Application>> {
        let app = self.acquire(name, options).await?;
        self.inner.registry.mark_active(app.name());
        self.publish_shortcuts(&app);
        Ok(app)
    }

    fn acquire(
        &self,
        name: &str,
        options: LoadOptions,
    ) -> BoxFuture<'static, AppResult<Arc<Application>>> {
        let claim = self.inner.registry.claim(name, |state_tx| {
            let loader = self.clone();
            let name = name.to_string();
            async move { loader.load_fresh(name, options, state_tx).await }.boxed()
        });

        match claim {
            Claim::Ready(app) => {
                debug!(app = name, "Application already loaded");
                futures::future::ready(Ok(app)).boxed()
            },
            Claim::Pending(load) => load.boxed(),
        }
    }

    async fn load_fresh(
        self,
        name: String,
        options: LoadOptions,
        state_tx: watch::Sender<AppState>,
    ) -> AppResult<Arc<Application>> {
        info!(app = %name, "Loading application");

        match self.build(&name, &options, state_tx).await {
            Ok(app) => {
                let app = Arc::new(app);
                self.inner.registry.complete(Arc::clone(&app));
                if let Some(on_load) = &app.module().on_load {
                    on_load(&app);
                }
                self.inner.context.bus().publish(
                    topics::APP_READY,
                    json!({
                        "app": app.name(),
                        "degradations": app.degradations(),
                    }),
                );
                info!(
                    app = %name,
                    degradations = app.degradations().len(),
                    "Application ready"
                );
                Ok(app)
            },
            Err(e) => {
                let removed = self.inner.context.bus().off_owner(&name);
                self.inner.registry.abandon(&name);
                error!(app = %name, error = %e, removed_subscriptions = removed, "Application failed to load");
                Err(e)
            },
        }
    }

    async fn build(
        &self,
        name: &str,
        options: &LoadOptions,
        state_tx: watch::Sender<AppState>,
    ) -> AppResult<Application> {
        let context = &self.inner.context;
        let (app_path, api_url) = self.locate(name, options);
        let mut app = PendingApplication::new(name, app_path, api_url, state_tx);

        let location = ModuleLocation::app(name, &app.app_path);
        debug!(app = name, location = %location, "Resolving module");
        app.module = context
            .resolver()
            .resolve(&location)
            .await
            .map_err(|e| AppError::module_resolution(name, e))?;
        app.advance(AppState::ConfigPending)?;

        if app.module.has_config_file {
            app.build_config = self.fetch_build_config(&mut app).await;
        }
        if app.build_config.get("version").and_then(Value::as_str) == Some(PRO_SUB_MODULE)
            && !app.module.sub_modules.iter().any(|s| s == PRO_SUB_MODULE)
        {
            debug!(app = name, "Pro build, appending sub-module");
            app.module.sub_modules.push(PRO_SUB_MODULE.to_string());
        }
        app.advance(AppState::ConfigResolved)?;

        app.advance(AppState::ComposingSubmodules)?;
        SubmoduleComposer::new(Arc::clone(context.resolver()), context.bus().clone())
            .compose(&mut app)
            .await?;

        app.advance(AppState::ResolvingDependencies)?;
        let principal = context.session().principal();
        let resolver = DependencyResolver {
            fetcher: context.assets().as_ref(),
            catalog: context.catalog(),
            registry: &self.inner.registry,
            extensions: self,
        };
        let report = resolver
            .resolve(name, &app.app_path, &app.module.external_scripts, &principal)
            .await;
        app.degradations.extend(report.degradations());
        app.dependencies = report;

        self.finalize(app).await
    }

    /// Where the application's code lives and where its calls go.
    fn locate(&self, name: &str, options: &LoadOptions) -> (String, String) {
        let context = &self.inner.context;
        let mut app_path = options
            .source_url
            .clone()
            .unwrap_or_else(|| format!("apps/{name}"));
        let mut api_url = context.config().api.default_url.clone();

        if let Some(installed) = context.session().installed_app(name) {
            if let Some(source_url) = installed.source_url {
                app_path = with_trailing_slash(&source_url);
            }
            if let Some(installed_api) = installed.api_url {
                api_url = with_trailing_slash(&installed_api);
            }
        }
        if let Some(explicit) = &options.api_url {
            api_url.clone_from(explicit);
        }

        debug!(app = name, app_path = %app_path, api_url = %api_url, "Application located");
        (app_path, api_url)
    }

    async fn fetch_build_config(&self, app: &mut PendingApplication) -> Value {
        let context = &self.inner.context;
        let url = join_path(&app.app_path, "app-build-config.json");

        context
            .bus()
            .publish(topics::REQUEST_START, json!({ "url": url }));
        let result = context.assets().fetch_json(&url).await;
        context
            .bus()
            .publish(topics::REQUEST_END, json!({ "url": url }));

        match result {
            Ok(config) => config,
            Err(e) => {
                warn!(app = %app.name, error = %e, "Build config unavailable, using defaults");
                app.degrade(Degradation::ConfigUnavailable {
                    reason: e.to_string(),
                });
                Value::Object(Map::new())
            },
        }
    }

    async fn finalize(&self, mut app: PendingApplication) -> AppResult<Application> {
        let context = &self.inner.context;
        let config = context.config();

        let own = register_subscriptions(
            &app.name,
            &app.module.subscribe,
            &app.module.methods,
            context.bus(),
        )?;
        app.subscriptions.extend(own);

        self.request_stylesheets(&app).await;

        let language = config.host.effective_language();
        let locales = Arc::new(LocaleStore::new(
            app.name.as_str(),
            app.app_path.as_str(),
            &config.host.default_language,
            language,
            app.module.i18n.keys().cloned(),
            Arc::clone(context.assets()),
            context.bus().clone(),
        ));
        let missing = locales.ensure(language).await;
        app.degradations.extend(missing);

        if app.name != config.host.core_app
            && let Some(core) = self.inner.registry.get(&config.host.core_app)
        {
            locales.absorb(core.locales());
        }

        let parts = ReadyParts {
            locales,
            gateway: context
                .gateway()
                .scoped(app.name.as_str(), Some(app.api_url.clone())),
            flags: UiFlags::new(app.name.as_str(), Arc::clone(context.session())),
            active: self.inner.registry.active().clone(),
        };
        app.into_ready(parts)
    }

    async fn request_stylesheets(&self, app: &PendingApplication) {
        let context = &self.inner.context;
        let config = context.config();

        let mut sheets = if config.build.preloaded_apps.contains(&app.name) {
            debug!(app = %app.name, "Stylesheets preloaded");
            Vec::new()
        } else {
            app.module.css.clone()
        };
        let language = normalize_language(config.host.effective_language());
        if language != normalize_language(&config.host.default_language)
            && app
                .module
                .i18n
                .iter()
                .any(|(tag, support)| normalize_language(tag) == language && support.custom_css)
        {
            sheets.push(format!("cssI18n/{language}"));
        }

        let assets = context.assets();
        let requests = sheets.iter().map(|sheet| {
            let url = join_path(&app.app_path, &format!("style/{sheet}.css"));
            async move {
                let result = assets.load_stylesheet(&url).await;
                (url, result)
            }
        });
        for (url, result) in join_all(requests).await {
            if let Err(e) = result {
                warn!(app = %app.name, url = %url, error = %e, "Stylesheet failed to load");
            }
        }
    }

    fn publish_shortcuts(&self, app: &Application) {
        let bundle = app.i18n();
        let titles = bundle.get("shortcuts");
        let shortcuts: Vec<Value> = app
            .module()
            .shortcuts
            .iter()
            .map(|(key, topic)| {
                let title = titles
                    .and_then(|t| t.get(key))
                    .cloned()
                    .unwrap_or_else(|| Value::String(topic.clone()));
                json!({
                    "key": format!("alt+{key}"),
                    "topic": topic,
                    "title": title,
                })
            })
            .collect();

        self.inner.context.bus().publish(
            topics::SHORTCUTS_CHANGED,
            json!({
                "category": SHORTCUT_CATEGORY,
                "app": app.name(),
                "shortcuts": shortcuts,
            }),
        );
    }
}

#[async_trait]
impl ExtensionLoader for AppLoader {
    async fn load_extension(&self, name: &str) -> AppResult<Arc<Application>> {
        self.acquire(name, LoadOptions::default()).await
    }
}

impl fmt::Debug for AppLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLoader")
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}
