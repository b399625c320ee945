//! Configuration types for the Mosaic host.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration for the Mosaic host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host identity, languages and UI metadata.
    pub host: HostSection,
    /// API root and cluster routing.
    pub api: ApiSection,
    /// Feature flags gating gateway calls.
    pub features: FeaturesSection,
    /// Build-time packaging facts.
    pub build: BuildSection,
    /// Whitelabel behaviour.
    pub whitelabel: WhitelabelSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
    /// Gateway hook table overrides.
    pub gateway: GatewaySection,
}

// ---------------------------------------------------------------------------
// HostSection
// ---------------------------------------------------------------------------

/// Host identity and language settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Language every application bundle falls back to.
    pub default_language: String,
    /// Preferred language of the session. Falls back to `default_language`.
    pub language: Option<String>,
    /// Name of the core application whose translations are shared.
    pub core_app: String,
    /// UI version stamped into every API call.
    pub version: String,
    /// UI name stamped into every API call.
    pub ui_name: String,
    /// Domain the host is served from; gates whitelabel updates.
    pub domain: Option<String>,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            default_language: "en-US".to_owned(),
            language: None,
            core_app: "core".to_owned(),
            version: "0.1.0".to_owned(),
            ui_name: "mosaic".to_owned(),
            domain: None,
        }
    }
}

impl HostSection {
    /// The effective session language.
    #[must_use]
    pub fn effective_language(&self) -> &str {
        self.language.as_deref().unwrap_or(&self.default_language)
    }
}

// ---------------------------------------------------------------------------
// ApiSection
// ---------------------------------------------------------------------------

/// API endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Default API root for applications without an override.
    pub default_url: String,
    /// Cluster identifier sent with every call when set.
    pub cluster_id: Option<String>,
    /// Header carrying the cluster identifier.
    pub cluster_header: String,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            default_url: "http://localhost:8000/v2/".to_owned(),
            cluster_id: None,
            cluster_header: "X-Kazoo-Cluster-ID".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeaturesSection
// ---------------------------------------------------------------------------

/// Feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesSection {
    /// Veto every billing call before it reaches the transport.
    pub disable_billing: bool,
}

// ---------------------------------------------------------------------------
// BuildSection
// ---------------------------------------------------------------------------

/// Packaging facts of the running build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Applications whose stylesheets ship inside the main bundle.
    pub preloaded_apps: Vec<String>,
}

// ---------------------------------------------------------------------------
// WhitelabelSection
// ---------------------------------------------------------------------------

/// Whitelabel settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelabelSection {
    /// Send `accept_charges = true` with every API call.
    pub auto_accept_charges: bool,
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["mosaic_gateway=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// GatewaySection
// ---------------------------------------------------------------------------

/// Gateway hook overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// `"<module>.<method>" = "<hook name>"` entries layered over the
    /// standard hook table. `"passthrough"` removes a standard hook.
    pub hooks: BTreeMap<String, String>,
}
