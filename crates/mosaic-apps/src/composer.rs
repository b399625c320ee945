//! Sequential sub-module composition.

use std::collections::BTreeMap;
use std::sync::Arc;

use mosaic_events::{EventBus, EventHandler, SubscriberId};
use tracing::{debug, info};

use crate::application::PendingApplication;
use crate::assets::{ModuleLocation, ModuleResolver};
use crate::error::{AppError, AppResult};
use crate::module::HandlerRef;

/// Merges an application's sub-modules into it, one at a time.
pub(crate) struct SubmoduleComposer {
    resolver: Arc<dyn ModuleResolver>,
    bus: EventBus,
}

impl SubmoduleComposer {
    pub(crate) fn new(resolver: Arc<dyn ModuleResolver>, bus: EventBus) -> Self {
        Self { resolver, bus }
    }

    /// Resolve and merge every sub-module of `app`, in order.
    ///
    /// Each sub-module's subscriptions are registered on the bus as
    /// separate handlers; the application's own `subscribe` table is not
    /// touched. Returns the number of sub-modules merged.
    pub(crate) async fn compose(&self, app: &mut PendingApplication) -> AppResult<usize> {
        let ids = app.module.sub_modules.clone();

        for id in &ids {
            let location = ModuleLocation::sub_module(&app.name, &app.app_path, id);
            debug!(app = %app.name, sub_module = %id, location = %location, "Resolving sub-module");

            let sub = self
                .resolver
                .resolve(&location)
                .await
                .map_err(|e| AppError::module_resolution(&app.name, e))?;

            app.module.absorb(&sub);
            let registered =
                register_subscriptions(&app.name, &sub.subscribe, &app.module.methods, &self.bus)?;
            app.subscriptions.extend(registered);
        }

        if !ids.is_empty() {
            info!(app = %app.name, count = ids.len(), "Sub-modules merged");
        }
        Ok(ids.len())
    }
}

/// Register `subscribe` on the bus on behalf of `app`.
///
/// [`HandlerRef::Method`] names are looked up in `methods`. On an unknown
/// name the handlers registered so far stay on the bus under `app`; the
/// caller removes them with [`EventBus::off_owner`].
pub(crate) fn register_subscriptions(
    app: &str,
    subscribe: &BTreeMap<String, HandlerRef>,
    methods: &BTreeMap<String, EventHandler>,
    bus: &EventBus,
) -> AppResult<Vec<SubscriberId>> {
    let mut ids = Vec::with_capacity(subscribe.len());
    for (topic, handler) in subscribe {
        let handler = match handler {
            HandlerRef::Inline(handler) => Arc::clone(handler),
            HandlerRef::Method(name) => methods.get(name).map(Arc::clone).ok_or_else(|| {
                AppError::UnknownHandler {
                    app: app.to_string(),
                    topic: topic.clone(),
                    method: name.clone(),
                }
            })?,
        };
        ids.push(bus.on(topic.as_str(), app, handler));
        debug!(app, topic = %topic, "Subscription registered");
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssetError;
    use crate::module::ModuleDefinition;
    use crate::state::AppState;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::watch;

    #[derive(Default)]
    struct Modules {
        defs: HashMap<String, ModuleDefinition>,
        resolved: Mutex<Vec<String>>,
    }

    impl Modules {
        fn with(mut self, path: &str, def: ModuleDefinition) -> Self {
            self.defs.insert(path.to_string(), def);
            self
        }
    }

    #[async_trait]
    impl ModuleResolver for Modules {
        async fn resolve(&self, location: &ModuleLocation) -> Result<ModuleDefinition, AssetError> {
            self.resolved.lock().unwrap().push(location.path.clone());
            self.defs
                .get(&location.path)
                .cloned()
                .ok_or_else(|| AssetError::new(&location.path, "not found"))
        }
    }

    fn pending(module: ModuleDefinition) -> PendingApplication {
        let (tx, _rx) = watch::channel(AppState::Unregistered);
        let mut app = PendingApplication::new("voip", "apps/voip".into(), "api/".into(), tx);
        app.module = module;
        app
    }

    fn counter(hits: &Arc<AtomicUsize>) -> EventHandler {
        let hits = Arc::clone(hits);
        Arc::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_same_topic_from_two_sub_modules_both_fire() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let resolver = Modules::default()
            .with(
                "apps/voip/submodules/m1/m1",
                ModuleDefinition::new()
                    .with_method("onRefresh1", counter(&first))
                    .subscribing("voip.refresh", HandlerRef::Method("onRefresh1".into())),
            )
            .with(
                "apps/voip/submodules/m2/m2",
                ModuleDefinition::new()
                    .subscribing("voip.refresh", HandlerRef::Inline(counter(&second))),
            );
        let bus = EventBus::new();
        let composer = SubmoduleComposer::new(Arc::new(resolver), bus.clone());
        let mut app = pending(
            ModuleDefinition::new()
                .with_sub_module("m1")
                .with_sub_module("m2"),
        );

        let merged = composer.compose(&mut app).await.unwrap();
        bus.publish("voip.refresh", json!({}));

        assert_eq!(merged, 2);
        assert_eq!(app.subscriptions.len(), 2);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
        assert!(app.module.subscribe.is_empty());
    }

    #[tokio::test]
    async fn test_later_sub_module_sees_earlier_methods() {
        let hits = Arc::new(AtomicUsize::new(0));
        let resolver = Modules::default()
            .with(
                "apps/voip/submodules/base/base",
                ModuleDefinition::new().with_method("render", counter(&hits)),
            )
            .with(
                "apps/voip/submodules/ext/ext",
                ModuleDefinition::new()
                    .subscribing("voip.render", HandlerRef::Method("render".into())),
            );
        let bus = EventBus::new();
        let composer = SubmoduleComposer::new(Arc::new(resolver), bus.clone());
        let mut app = pending(
            ModuleDefinition::new()
                .with_sub_module("base")
                .with_sub_module("ext"),
        );

        composer.compose(&mut app).await.unwrap();
        bus.publish("voip.render", json!({}));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_sub_module_is_fatal() {
        let resolver = Arc::new(Modules::default());
        let composer = SubmoduleComposer::new(Arc::clone(&resolver) as _, EventBus::new());
        let mut app = pending(
            ModuleDefinition::new()
                .with_sub_module("gone")
                .with_sub_module("never"),
        );

        let err = composer.compose(&mut app).await.unwrap_err();

        assert!(matches!(err, AppError::ModuleResolution { ref location, .. } if location == "apps/voip/submodules/gone/gone"));
        assert_eq!(resolver.resolved.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_method_rejected() {
        let bus = EventBus::new();
        let subscribe =
            BTreeMap::from([("voip.x".to_string(), HandlerRef::Method("missing".into()))]);

        let err = register_subscriptions("voip", &subscribe, &BTreeMap::new(), &bus).unwrap_err();

        assert_eq!(
            err,
            AppError::UnknownHandler {
                app: "voip".into(),
                topic: "voip.x".into(),
                method: "missing".into(),
            }
        );
    }
}
