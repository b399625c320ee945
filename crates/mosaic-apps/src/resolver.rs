//! Best-effort loading of an application's external scripts and extensions.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::join_all;
use mosaic_core::{AppCatalog, Principal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::Application;
use crate::assets::{AssetFetcher, join_path};
use crate::error::{AppResult, Degradation};
use crate::permission::PermissionFilter;
use crate::registry::ApplicationRegistry;

/// Loads an extension application through the shared registry.
#[async_trait]
pub trait ExtensionLoader: Send + Sync {
    /// Load (or join the load of) extension `name`.
    async fn load_extension(&self, name: &str) -> AppResult<Arc<Application>>;
}

/// What kind of dependency a task loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// `<appPath>/external/<name>.js`.
    Script,
    /// A catalog extension application.
    Extension,
}

/// One dependency of an application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Dependency kind.
    pub kind: DependencyKind,
    /// Script identifier or extension name.
    pub name: String,
}

impl Dependency {
    fn script(name: &str) -> Self {
        Self {
            kind: DependencyKind::Script,
            name: name.to_string(),
        }
    }

    fn extension(name: &str) -> Self {
        Self {
            kind: DependencyKind::Extension,
            name: name.to_string(),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DependencyKind::Script => write!(f, "script:{}", self.name),
            DependencyKind::Extension => write!(f, "extension:{}", self.name),
        }
    }
}

/// Why an extension was not loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Listed for the application but absent from the catalog.
    NotInCatalog,
    /// Already ready or loading.
    AlreadyLoaded,
    /// Not visible to the logged-in user.
    NotPermitted,
}

/// A dependency that failed to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDependency {
    /// The dependency.
    pub dependency: Dependency,
    /// Why it failed.
    pub reason: String,
}

/// An extension that was not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDependency {
    /// Extension name.
    pub name: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// Outcome of resolving an application's dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Loaded dependencies, in completion order.
    pub loaded: Vec<Dependency>,
    /// Failed dependencies.
    pub failed: Vec<FailedDependency>,
    /// Skipped extensions.
    pub skipped: Vec<SkippedDependency>,
}

impl ResolutionReport {
    /// One [`Degradation::DependencyFailed`] per failure.
    #[must_use]
    pub fn degradations(&self) -> Vec<Degradation> {
        self.failed
            .iter()
            .map(|f| Degradation::DependencyFailed {
                dependency: f.dependency.to_string(),
                reason: f.reason.clone(),
            })
            .collect()
    }

    /// Whether an extension called `name` was skipped, and why.
    #[must_use]
    pub fn skip_reason(&self, name: &str) -> Option<SkipReason> {
        self.skipped
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.reason)
    }
}

/// Fans out one task per external script and permitted extension and waits
/// for all of them. Failures are recorded, never propagated.
pub(crate) struct DependencyResolver<'a> {
    pub(crate) fetcher: &'a dyn AssetFetcher,
    pub(crate) catalog: &'a AppCatalog,
    pub(crate) registry: &'a ApplicationRegistry,
    pub(crate) extensions: &'a dyn ExtensionLoader,
}

impl DependencyResolver<'_> {
    pub(crate) async fn resolve(
        &self,
        app: &str,
        app_path: &str,
        scripts: &[String],
        principal: &Principal,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        let mut tasks = Vec::new();

        for script in scripts {
            let dependency = Dependency::script(script);
            let url = join_path(app_path, &format!("external/{script}.js"));
            tasks.push(
                async move {
                    let result = self
                        .fetcher
                        .load_script(&url)
                        .await
                        .map_err(|e| e.to_string());
                    (dependency, result)
                }
                .boxed(),
            );
        }

        let filter = PermissionFilter::new(self.catalog, principal);
        let mut seen = BTreeSet::new();
        for name in self.catalog.extensions_of(app) {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let skip = if !self.catalog.contains(name) {
                Some(SkipReason::NotInCatalog)
            } else if self.registry.contains(name) {
                Some(SkipReason::AlreadyLoaded)
            } else if !filter.permits(name) {
                Some(SkipReason::NotPermitted)
            } else {
                None
            };

            if let Some(reason) = skip {
                debug!(app, extension = %name, ?reason, "Extension skipped");
                report.skipped.push(SkippedDependency {
                    name: name.clone(),
                    reason,
                });
                continue;
            }

            let dependency = Dependency::extension(name);
            tasks.push(
                async move {
                    let result = self
                        .extensions
                        .load_extension(name)
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string());
                    (dependency, result)
                }
                .boxed(),
            );
        }

        let attempted = tasks.len();
        for (dependency, result) in join_all(tasks).await {
            match result {
                Ok(()) => report.loaded.push(dependency),
                Err(reason) => {
                    warn!(app, dependency = %dependency, error = %reason, "Dependency failed to load");
                    report.failed.push(FailedDependency { dependency, reason });
                },
            }
        }

        info!(
            app,
            attempted,
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Dependencies resolved"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, AssetError};
    use mosaic_core::{AllowedUsers, ExtensionDescriptor};
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Scripts {
        broken: Vec<String>,
        loaded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetFetcher for Scripts {
        async fn fetch_json(&self, url: &str) -> Result<Value, AssetError> {
            Err(AssetError::new(url, "unused"))
        }

        async fn load_script(&self, url: &str) -> Result<(), AssetError> {
            tokio::task::yield_now().await;
            if self.broken.iter().any(|b| url.ends_with(b.as_str())) {
                return Err(AssetError::new(url, "404"));
            }
            self.loaded.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn load_stylesheet(&self, _url: &str) -> Result<(), AssetError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Extensions {
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ExtensionLoader for Extensions {
        async fn load_extension(&self, name: &str) -> AppResult<Arc<Application>> {
            self.requested.lock().unwrap().push(name.to_string());
            Err(AppError::ModuleResolution {
                app: name.to_string(),
                location: format!("apps/{name}/app"),
                message: "offline".into(),
            })
        }
    }

    fn catalog() -> AppCatalog {
        AppCatalog::new()
            .with_entry(
                ExtensionDescriptor::new("voip")
                    .with_extension("recorder")
                    .with_extension("beta")
                    .with_extension("ghost"),
            )
            .with_entry(ExtensionDescriptor::new("recorder"))
            .with_entry(
                ExtensionDescriptor::new("beta")
                    .with_allowed_users(AllowedUsers::Specific)
                    .with_user("someone-else"),
            )
    }

    #[tokio::test]
    async fn test_best_effort_fan_out() {
        let fetcher = Scripts {
            broken: vec!["bad.js".into()],
            ..Scripts::default()
        };
        let catalog = catalog();
        let registry = ApplicationRegistry::new();
        let extensions = Extensions::default();
        let resolver = DependencyResolver {
            fetcher: &fetcher,
            catalog: &catalog,
            registry: &registry,
            extensions: &extensions,
        };
        let principal = Principal {
            id: Some("u1".into()),
            is_admin: false,
        };

        let report = resolver
            .resolve(
                "voip",
                "apps/voip",
                &["good".to_string(), "bad".to_string()],
                &principal,
            )
            .await;

        assert_eq!(report.loaded, [Dependency::script("good")]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.skip_reason("beta"), Some(SkipReason::NotPermitted));
        assert_eq!(report.skip_reason("ghost"), Some(SkipReason::NotInCatalog));
        assert_eq!(*extensions.requested.lock().unwrap(), ["recorder"]);
        assert_eq!(*fetcher.loaded.lock().unwrap(), ["apps/voip/external/good.js"]);

        let degradations = report.degradations();
        assert!(degradations.contains(&Degradation::DependencyFailed {
            dependency: "extension:recorder".into(),
            reason: "failed to resolve module for 'recorder' at apps/recorder/app: offline".into(),
        }));
    }
}
