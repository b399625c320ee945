//! Mock collaborators for testing.
//!
//! All mocks use `std::sync::Mutex` internally so builders work without a
//! tokio runtime. No lock is held across an `.await`.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use mosaic_apps::{AssetError, AssetFetcher, ModuleDefinition, ModuleLocation, ModuleResolver};
use mosaic_core::ResourceId;
use mosaic_gateway::{
    ApiRequest, ApiResponse, ProgressEvent, ResourceCatalog, Transport, TransportError,
};
use serde_json::{Value, json};
use tokio::sync::Semaphore;

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock [`ModuleResolver`] serving definitions by module path.
///
/// Every resolution yields once before answering, so concurrent loads
/// really overlap.
#[derive(Debug, Default)]
pub struct MockModuleResolver {
    modules: Mutex<HashMap<String, ModuleDefinition>>,
    failures: Mutex<HashSet<String>>,
    resolved: Mutex<Vec<String>>,
}

impl MockModuleResolver {
    /// Create an empty resolver. Every path fails until registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `definition` at `path` (e.g. `apps/voip/app`).
    #[must_use]
    pub fn with_module(self, path: impl Into<String>, definition: ModuleDefinition) -> Self {
        self.insert(path, definition);
        self
    }

    /// Fail resolution of `path` even if a definition is registered.
    #[must_use]
    pub fn with_failure(self, path: impl Into<String>) -> Self {
        locked(&self.failures).insert(path.into());
        self
    }

    /// Serve `definition` at `path` from now on.
    pub fn insert(&self, path: impl Into<String>, definition: ModuleDefinition) {
        locked(&self.modules).insert(path.into(), definition);
    }

    /// Stop failing `path`.
    pub fn heal(&self, path: &str) {
        locked(&self.failures).remove(path);
    }

    /// Every path resolved so far, in request order.
    #[must_use]
    pub fn resolved(&self) -> Vec<String> {
        locked(&self.resolved).clone()
    }

    /// How many times `path` was resolved.
    #[must_use]
    pub fn resolution_count(&self, path: &str) -> usize {
        locked(&self.resolved).iter().filter(|p| *p == path).count()
    }
}

#[async_trait]
impl ModuleResolver for MockModuleResolver {
    async fn resolve(&self, location: &ModuleLocation) -> Result<ModuleDefinition, AssetError> {
        locked(&self.resolved).push(location.path.clone());
        tokio::task::yield_now().await;

        if locked(&self.failures).contains(&location.path) {
            return Err(AssetError::new(&location.path, "mock resolution failure"));
        }
        locked(&self.modules)
            .get(&location.path)
            .cloned()
            .ok_or_else(|| AssetError::new(&location.path, "module not found"))
    }
}

/// Mock [`AssetFetcher`] serving JSON documents by URL.
///
/// Scripts and stylesheets succeed unless marked as failing.
#[derive(Debug, Default)]
pub struct MockAssetFetcher {
    documents: Mutex<HashMap<String, Value>>,
    failures: Mutex<HashSet<String>>,
    json_requests: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    stylesheets: Mutex<Vec<String>>,
}

impl MockAssetFetcher {
    /// Create a fetcher with no documents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` at `url`.
    #[must_use]
    pub fn with_json(self, url: impl Into<String>, document: Value) -> Self {
        locked(&self.documents).insert(url.into(), document);
        self
    }

    /// Fail every request for `url`.
    #[must_use]
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        locked(&self.failures).insert(url.into());
        self
    }

    /// JSON URLs requested so far.
    #[must_use]
    pub fn json_requests(&self) -> Vec<String> {
        locked(&self.json_requests).clone()
    }

    /// Scripts loaded successfully.
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        locked(&self.scripts).clone()
    }

    /// Stylesheets requested successfully.
    #[must_use]
    pub fn stylesheets(&self) -> Vec<String> {
        locked(&self.stylesheets).clone()
    }

    fn check(&self, url: &str) -> Result<(), AssetError> {
        if locked(&self.failures).contains(url) {
            Err(AssetError::new(url, "mock fetch failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AssetFetcher for MockAssetFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, AssetError> {
        locked(&self.json_requests).push(url.to_string());
        tokio::task::yield_now().await;
        self.check(url)?;
        locked(&self.documents)
            .get(url)
            .cloned()
            .ok_or_else(|| AssetError::new(url, "404 not found"))
    }

    async fn load_script(&self, url: &str) -> Result<(), AssetError> {
        tokio::task::yield_now().await;
        self.check(url)?;
        locked(&self.scripts).push(url.to_string());
        Ok(())
    }

    async fn load_stylesheet(&self, url: &str) -> Result<(), AssetError> {
        self.check(url)?;
        locked(&self.stylesheets).push(url.to_string());
        Ok(())
    }
}

/// Mock [`Transport`] recording every request.
///
/// Offers the standard resource catalog by default and answers `200 {}`
/// unless a reply is queued for the resource. Upload progress events are
/// driven before the optional gate is passed.
#[derive(Debug)]
pub struct MockTransport {
    catalog: ResourceCatalog,
    replies: Mutex<HashMap<String, VecDeque<Result<ApiResponse, TransportError>>>>,
    sent: Mutex<Vec<ApiRequest>>,
    upload_progress: Vec<ProgressEvent>,
    gate: Option<Arc<Semaphore>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// A transport offering the standard resources.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: ResourceCatalog::standard(),
            replies: Mutex::new(HashMap::new()),
            sent: Mutex::new(Vec::new()),
            upload_progress: Vec::new(),
            gate: None,
        }
    }

    /// Offer `catalog` instead of the standard resources.
    #[must_use]
    pub fn with_catalog(mut self, catalog: ResourceCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Queue a successful reply for `resource`.
    #[must_use]
    pub fn with_reply(self, resource: &str, data: Value) -> Self {
        self.queue(resource, Ok(ApiResponse::ok(data)));
        self
    }

    /// Queue a failure for `resource`.
    #[must_use]
    pub fn with_error(self, resource: &str, error: TransportError) -> Self {
        self.queue(resource, Err(error));
        self
    }

    /// Drive these progress events on every upload call.
    #[must_use]
    pub fn with_upload_progress(mut self, events: Vec<ProgressEvent>) -> Self {
        self.upload_progress = events;
        self
    }

    /// Hold every call until a permit is available on `gate`.
    #[must_use]
    pub fn with_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Queue a reply for `resource`.
    pub fn queue(&self, resource: &str, reply: Result<ApiResponse, TransportError>) {
        locked(&self.replies)
            .entry(resource.to_string())
            .or_default()
            .push_back(reply);
    }

    /// Every request sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<ApiRequest> {
        locked(&self.sent).clone()
    }

    /// Resource ids of every request sent so far.
    #[must_use]
    pub fn sent_resources(&self) -> Vec<String> {
        locked(&self.sent)
            .iter()
            .map(|r| r.resource.to_string())
            .collect()
    }

    /// Number of requests sent.
    #[must_use]
    pub fn call_count(&self) -> usize {
        locked(&self.sent).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn supports(&self, resource: &ResourceId) -> bool {
        self.catalog.contains(resource)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        locked(&self.sent).push(request.clone());

        if let Some(progress) = &request.settings.upload_progress {
            for event in &self.upload_progress {
                progress(*event);
            }
        }

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| TransportError::new("gate closed"))?
                .forget();
        }

        let key = request.resource.to_string();
        locked(&self.replies)
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Ok(ApiResponse::ok(json!({}))))
    }
}
