//! Transport contract and the request/response shapes it exchanges.
//!
//! The transport is the low-level API client. The gateway hands it a fully
//! assembled [`ApiRequest`] and gets back exactly one outcome.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use mosaic_core::ResourceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TransportError;

/// A progress notification from an in-flight upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Bytes sent so far.
    pub loaded: u64,
    /// Total bytes, when known.
    pub total: Option<u64>,
}

impl ProgressEvent {
    /// A progress event with a known total.
    #[must_use]
    pub fn computable(loaded: u64, total: u64) -> Self {
        Self {
            loaded,
            total: Some(total),
        }
    }

    /// A progress event whose total is unknown.
    #[must_use]
    pub fn indeterminate(loaded: u64) -> Self {
        Self {
            loaded,
            total: None,
        }
    }

    /// Whether a percentage can be computed.
    #[must_use]
    pub fn is_computable(&self) -> bool {
        self.total.is_some_and(|t| t > 0)
    }
}

/// Callback the transport drives while an upload is in flight.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// UI metadata stamped on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiMetadata {
    /// UI version.
    pub version: String,
    /// UI name.
    pub ui: String,
    /// Application that issued the call.
    pub origin: String,
}

/// Fully assembled settings for one call.
#[derive(Clone)]
pub struct ApiSettings {
    /// Auth token sent with the call.
    pub auth_token: Option<String>,
    /// API root the call is sent to.
    pub api_root: String,
    /// UI metadata.
    pub ui_metadata: UiMetadata,
    /// Extra headers (e.g. the cluster id).
    pub headers: BTreeMap<String, String>,
    /// Call parameters (path ids, body under `data`, filters).
    pub data: Map<String, Value>,
    /// Accept charges without prompting.
    pub accept_charges: bool,
    /// Skip the global request-in-progress indicator.
    pub bypass_progress_indicator: bool,
    /// Upload progress callback, for upload calls.
    pub upload_progress: Option<ProgressCallback>,
}

impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("has_auth_token", &self.auth_token.is_some())
            .field("api_root", &self.api_root)
            .field("ui_metadata", &self.ui_metadata)
            .field("headers", &self.headers)
            .field("data", &self.data)
            .field("accept_charges", &self.accept_charges)
            .field("bypass_progress_indicator", &self.bypass_progress_indicator)
            .field("has_upload_progress", &self.upload_progress.is_some())
            .finish()
    }
}

/// A call handed to the transport.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Resource being called.
    pub resource: ResourceId,
    /// Assembled settings.
    pub settings: ApiSettings,
}

/// A successful API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    /// Status code.
    pub status: u16,
    /// Response document (the envelope's `data` field).
    pub data: Value,
}

impl ApiResponse {
    /// A `200` response carrying `data`.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self { status: 200, data }
    }
}

/// The low-level API client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether the transport offers `resource`.
    fn supports(&self, resource: &ResourceId) -> bool;

    /// Send a call. Resolves exactly once with the outcome and may drive
    /// `settings.upload_progress` before resolving.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Set of resources a transport offers.
#[derive(Debug, Clone, Default)]
pub struct ResourceCatalog {
    resources: HashSet<ResourceId>,
}

/// `(module, methods)` offered by the standard API client.
const STANDARD_RESOURCES: &[(&str, &[&str])] = &[
    ("account", &["get", "create", "update", "patch", "delete", "listChildren", "listDescendants"]),
    ("user", &["get", "create", "update", "patch", "delete", "list"]),
    ("conference", &["get", "create", "update", "patch", "delete", "list"]),
    ("billing", &["get", "update"]),
    ("numbers", &["get", "update", "list", "activate", "delete"]),
    ("whitelabel", &[
        "get",
        "getByDomain",
        "create",
        "update",
        "delete",
        "updateLogo",
        "updateIcon",
        "getLogo",
        "getIcon",
    ]),
    ("media", &["get", "create", "update", "delete", "list", "upload"]),
    ("port", &[
        "get",
        "create",
        "update",
        "delete",
        "list",
        "createAttachment",
        "updateAttachment",
    ]),
    ("device", &["get", "create", "update", "patch", "delete", "list"]),
    ("callflow", &["get", "create", "update", "patch", "delete", "list"]),
    ("vmbox", &["get", "create", "update", "patch", "delete", "list"]),
    ("appsStore", &["list", "get", "add", "update"]),
];

impl ResourceCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The resources offered by the standard API client.
    #[must_use]
    pub fn standard() -> Self {
        STANDARD_RESOURCES
            .iter()
            .flat_map(|(module, methods)| {
                methods
                    .iter()
                    .filter_map(move |method| ResourceId::new(*module, *method).ok())
            })
            .collect()
    }

    /// Add a resource.
    #[must_use]
    pub fn with(mut self, resource: ResourceId) -> Self {
        self.resources.insert(resource);
        self
    }

    /// Whether `resource` is offered.
    #[must_use]
    pub fn contains(&self, resource: &ResourceId) -> bool {
        self.resources.contains(resource)
    }

    /// Number of resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl FromIterator<ResourceId> for ResourceCatalog {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ResourceId {
        ResourceId::parse(s).unwrap()
    }

    #[test]
    fn test_standard_catalog_covers_hooked_resources() {
        let catalog = ResourceCatalog::standard();
        for resource in [
            "account.update",
            "user.list",
            "conference.get",
            "conference.update",
            "billing.get",
            "numbers.update",
            "whitelabel.getByDomain",
            "media.upload",
            "port.updateAttachment",
        ] {
            assert!(catalog.contains(&id(resource)), "{resource} missing");
        }
        assert!(!catalog.contains(&id("media.teleport")));
    }

    #[test]
    fn test_progress_event_computable() {
        assert!(ProgressEvent::computable(5, 10).is_computable());
        assert!(!ProgressEvent::computable(0, 0).is_computable());
        assert!(!ProgressEvent::indeterminate(5).is_computable());
    }

    #[test]
    fn test_settings_debug_hides_token() {
        let settings = ApiSettings {
            auth_token: Some("secret-token".into()),
            api_root: "https://api/".into(),
            ui_metadata: UiMetadata {
                version: "1".into(),
                ui: "mosaic".into(),
                origin: "voip".into(),
            },
            headers: BTreeMap::new(),
            data: Map::new(),
            accept_charges: false,
            bypass_progress_indicator: false,
            upload_progress: None,
        };
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("has_auth_token: true"));
    }
}
