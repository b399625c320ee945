//! Per-application translation bundles.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use mosaic_core::{deep_merge, deep_merged, normalize_language};
use mosaic_events::{EventBus, topics};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::assets::{AssetFetcher, join_path};
use crate::error::Degradation;

/// Translation bundles for one application.
///
/// The default language is always loaded first and never fetched twice.
/// A non-default bundle is the default bundle overlaid with the fetched
/// data. Concurrent [`ensure`](Self::ensure) calls are serialized.
pub struct LocaleStore {
    app: String,
    app_path: String,
    default_language: String,
    preferred_language: String,
    supported: BTreeSet<String>,
    fetcher: Arc<dyn AssetFetcher>,
    bus: EventBus,
    bundles: RwLock<HashMap<String, Arc<Value>>>,
    fetch_lock: Mutex<()>,
}

impl LocaleStore {
    /// Create an empty store for `app`.
    ///
    /// `supported` lists the languages the application declares; tags are
    /// normalized (`en-us` becomes `en-US`).
    #[must_use]
    pub fn new(
        app: impl Into<String>,
        app_path: impl Into<String>,
        default_language: &str,
        preferred_language: &str,
        supported: impl IntoIterator<Item = String>,
        fetcher: Arc<dyn AssetFetcher>,
        bus: EventBus,
    ) -> Self {
        Self {
            app: app.into(),
            app_path: app_path.into(),
            default_language: normalize_language(default_language),
            preferred_language: normalize_language(preferred_language),
            supported: supported
                .into_iter()
                .map(|l| normalize_language(&l))
                .collect(),
            fetcher,
            bus,
            bundles: RwLock::new(HashMap::new()),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Make sure the default bundle and the bundle for `language` are
    /// loaded. An unsupported `language` is skipped and reported.
    pub async fn ensure(&self, language: &str) -> Vec<Degradation> {
        let _guard = self.fetch_lock.lock().await;
        let language = normalize_language(language);
        let mut degradations = Vec::new();

        if !self.is_loaded(&self.default_language) {
            if self.supports(&self.default_language) {
                let bundle = self.fetch(&self.default_language).await;
                self.insert(&self.default_language, bundle);
            } else if language == self.default_language {
                degradations.push(self.unsupported(&self.default_language));
            } else {
                debug!(app = %self.app, language = %self.default_language, "Default language not declared");
            }
        }

        if language != self.default_language && !self.is_loaded(&language) {
            if self.supports(&language) {
                let data = self.fetch(&language).await;
                let existing = self.bundle(&language);
                let default = self.bundle(&self.default_language);
                let empty = Value::Object(Map::new());
                let merged = deep_merged([
                    existing.as_deref().unwrap_or(&empty),
                    default.as_deref().unwrap_or(&empty),
                    &data,
                ]);
                self.insert(&language, merged);
            } else {
                degradations.push(self.unsupported(&language));
            }
        }

        degradations
    }

    /// Bundle for the preferred language, falling back to the default.
    ///
    /// The preferred bundle is only used when the application declares
    /// that language.
    #[must_use]
    pub fn active(&self) -> Arc<Value> {
        let bundles = self.bundles.read().unwrap_or_else(PoisonError::into_inner);
        let preferred = if self.supports(&self.preferred_language) {
            bundles.get(&self.preferred_language)
        } else {
            None
        };
        preferred
            .or_else(|| bundles.get(&self.default_language))
            .map_or_else(|| Arc::new(Value::Object(Map::new())), Arc::clone)
    }

    /// A string from the active bundle.
    #[must_use]
    pub fn translate(&self, key: &str) -> Option<String> {
        self.active()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Deep-merge the bundles of `other` over this store's loaded bundles.
    ///
    /// Each loaded language takes `other`'s bundle for the same language,
    /// or `other`'s default bundle when it has none. Languages this store
    /// has not loaded are left alone, except the default language which is
    /// taken from `other` when missing here.
    pub fn absorb(&self, other: &LocaleStore) {
        let theirs: HashMap<String, Arc<Value>> = other
            .bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        let fallback = theirs.get(&other.default_language);

        let mut ours = self.bundles.write().unwrap_or_else(PoisonError::into_inner);
        if !ours.contains_key(&self.default_language)
            && let Some(bundle) = theirs.get(&self.default_language)
        {
            ours.insert(self.default_language.clone(), Arc::clone(bundle));
        }
        for (language, bundle) in ours.iter_mut() {
            let Some(overlay) = theirs.get(language).or(fallback) else {
                continue;
            };
            let mut merged = (**bundle).clone();
            deep_merge(&mut merged, overlay);
            *bundle = Arc::new(merged);
        }
        debug!(app = %self.app, from = %other.app, "Absorbed translations");
    }

    /// Bundle for `language`, if loaded.
    #[must_use]
    pub fn bundle(&self, language: &str) -> Option<Arc<Value>> {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_language(language))
            .cloned()
    }

    /// Whether `language` has a loaded bundle.
    #[must_use]
    pub fn is_loaded(&self, language: &str) -> bool {
        self.bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&normalize_language(language))
    }

    /// Loaded languages, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .bundles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        languages.sort();
        languages
    }

    /// Whether the application declares `language`.
    #[must_use]
    pub fn supports(&self, language: &str) -> bool {
        self.supported.contains(language)
    }

    /// The host's default language.
    #[must_use]
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// The user's preferred language.
    #[must_use]
    pub fn preferred_language(&self) -> &str {
        &self.preferred_language
    }

    async fn fetch(&self, language: &str) -> Value {
        let url = join_path(&self.app_path, &format!("i18n/{language}.json"));
        self.bus
            .publish(topics::REQUEST_START, json!({ "url": url }));
        let result = self.fetcher.fetch_json(&url).await;
        self.bus.publish(topics::REQUEST_END, json!({ "url": url }));

        match result {
            Ok(bundle) => {
                debug!(app = %self.app, language, "Loaded translations");
                bundle
            },
            Err(e) => {
                warn!(app = %self.app, language, error = %e, "Failed to load translations");
                Value::Object(Map::new())
            },
        }
    }

    fn insert(&self, language: &str, bundle: Value) {
        self.bundles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language.to_string(), Arc::new(bundle));
    }

    fn unsupported(&self, language: &str) -> Degradation {
        info!(app = %self.app, language, "Language not supported by application");
        Degradation::LocaleUnavailable {
            language: language.to_string(),
        }
    }
}

impl fmt::Debug for LocaleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleStore")
            .field("app", &self.app)
            .field("default_language", &self.default_language)
            .field("preferred_language", &self.preferred_language)
            .field("supported", &self.supported)
            .field("loaded", &self.languages())
            .finish_non_exhaustive()
    }
}
