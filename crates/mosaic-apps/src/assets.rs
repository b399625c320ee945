//! Collaborators that fetch application code and assets.

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AssetError;
use crate::module::ModuleDefinition;

/// Where a module's code lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation {
    /// Application the module belongs to.
    pub app: String,
    /// Module path (e.g. `apps/voip/app`).
    pub path: String,
}

impl ModuleLocation {
    /// The application's own module under `app_path`.
    #[must_use]
    pub fn app(app: &str, app_path: &str) -> Self {
        Self {
            app: app.to_string(),
            path: join_path(app_path, "app"),
        }
    }

    /// Sub-module `id` of the application at `app_path`.
    #[must_use]
    pub fn sub_module(app: &str, app_path: &str, id: &str) -> Self {
        Self {
            app: app.to_string(),
            path: join_path(app_path, &format!("submodules/{id}/{id}")),
        }
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Resolves module code. Errors are fatal to the load that asked.
#[async_trait]
pub trait ModuleResolver: Send + Sync {
    /// Resolve the module at `location`.
    async fn resolve(&self, location: &ModuleLocation) -> Result<ModuleDefinition, AssetError>;
}

/// Fetches application assets.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch and parse a JSON document.
    async fn fetch_json(&self, url: &str) -> Result<Value, AssetError>;

    /// Load an external script.
    async fn load_script(&self, url: &str) -> Result<(), AssetError>;

    /// Request a stylesheet.
    async fn load_stylesheet(&self, url: &str) -> Result<(), AssetError>;
}

/// Join `rest` onto `base` with exactly one `/` between them.
#[must_use]
pub fn join_path(base: &str, rest: &str) -> String {
    let base = base.trim_end_matches('/');
    let rest = rest.trim_start_matches('/');
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

/// `url` with a trailing `/`.
#[must_use]
pub fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locations() {
        assert_eq!(ModuleLocation::app("voip", "apps/voip").path, "apps/voip/app");
        assert_eq!(
            ModuleLocation::app("voip", "https://cdn.example.com/voip/").path,
            "https://cdn.example.com/voip/app"
        );
        assert_eq!(
            ModuleLocation::sub_module("voip", "apps/voip", "pro").path,
            "apps/voip/submodules/pro/pro"
        );
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(join_path("apps/x/", "/i18n/en-US.json"), "apps/x/i18n/en-US.json");
        assert_eq!(with_trailing_slash("https://a"), "https://a/");
        assert_eq!(with_trailing_slash("https://a/"), "https://a/");
    }
}
