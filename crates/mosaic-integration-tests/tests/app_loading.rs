//! End-to-end application loading through a mock-backed host.

mod common;

use std::sync::Arc;

use common::{Counter, voip_host};
use mosaic_apps::{AppError, AppState, Degradation, HandlerRef, ModuleDefinition, SkipReason};
use mosaic_config::Config;
use mosaic_core::{AuthState, InstalledApp};
use mosaic_events::topics;
use mosaic_gateway::RequestIntent;
use mosaic_test::{
    EventRecorder, MockAssetFetcher, TestHost, test_admin, test_auth_state, test_module,
    test_user,
};
use serde_json::json;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_loads_resolve_once() {
    let host = voip_host(test_module()).build();
    let recorder = EventRecorder::attach(host.bus());

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let loader = host.loader.clone();
            tokio::spawn(async move { loader.load("voip").await })
        })
        .collect();

    let mut apps = Vec::new();
    for handle in handles {
        apps.push(handle.await.unwrap().unwrap());
    }

    assert!(apps.iter().all(|app| Arc::ptr_eq(app, &apps[0])));
    assert_eq!(host.resolver.resolution_count("apps/voip/app"), 1);
    let ready: Vec<_> = recorder
        .payloads(topics::APP_READY)
        .into_iter()
        .filter(|p| p["app"] == "voip")
        .collect();
    assert_eq!(ready.len(), 1);
    assert_eq!(host.loader.registry().state("voip"), AppState::Ready);
}

#[tokio::test]
async fn test_same_topic_from_two_sub_modules_both_fire() {
    let first = Counter::default();
    let second = Counter::default();
    let own = Counter::default();

    let host = voip_host(
        test_module()
            .with_sub_module("calls")
            .with_sub_module("history")
            .with_method("refresh", own.handler())
            .subscribing("voip.reload", HandlerRef::Method("refresh".into())),
    )
    .with_module(
        "apps/voip/submodules/calls/calls",
        ModuleDefinition::new().subscribing("voip.refresh", HandlerRef::Inline(first.handler())),
    )
    .with_module(
        "apps/voip/submodules/history/history",
        ModuleDefinition::new().subscribing("voip.refresh", HandlerRef::Inline(second.handler())),
    )
    .build();

    let app = host.loader.load("voip").await.unwrap();
    assert_eq!(app.subscriptions().len(), 3);

    host.bus().publish("voip.refresh", json!({}));
    host.bus().publish("voip.reload", json!({}));

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 1);
    assert_eq!(own.get(), 1);
}

#[tokio::test]
async fn test_sub_module_sees_methods_of_earlier_ones() {
    let hits = Counter::default();
    let host = voip_host(test_module().with_sub_module("calls").with_sub_module("history"))
        .with_module(
            "apps/voip/submodules/calls/calls",
            ModuleDefinition::new()
                .with_state(json!({"calls": []}))
                .with_method("render", hits.handler()),
        )
        .with_module(
            "apps/voip/submodules/history/history",
            ModuleDefinition::new()
                .with_state(json!({"history": {"limit": 50}}))
                .subscribing("voip.history.show", HandlerRef::Method("render".into())),
        )
        .build();

    let app = host.loader.load("voip").await.unwrap();
    host.bus().publish("voip.history.show", json!({}));

    assert_eq!(hits.get(), 1);
    assert_eq!(*app.data(), json!({"calls": [], "history": {"limit": 50}}));
    assert_eq!(
        host.resolver.resolved()[..3],
        [
            "apps/voip/app",
            "apps/voip/submodules/calls/calls",
            "apps/voip/submodules/history/history",
        ]
    );
}

#[tokio::test]
async fn test_extensions_filtered_by_permission() {
    let host = voip_host(test_module()).build();

    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(app.state(), AppState::Ready);
    assert!(host.loader.registry().is_ready("recorder"));
    assert!(!host.loader.registry().contains("reports"));
    assert!(!host.loader.registry().contains("beta"));
    assert_eq!(app.dependencies().skip_reason("reports"), Some(SkipReason::NotPermitted));
    assert_eq!(app.dependencies().skip_reason("beta"), Some(SkipReason::NotPermitted));
    assert!(app.degradations().is_empty());
}

#[tokio::test]
async fn test_admin_sees_every_extension() {
    let host = voip_host(test_module())
        .with_auth(test_auth_state(test_admin()))
        .build();

    let app = host.loader.load("voip").await.unwrap();

    for extension in ["recorder", "reports", "beta"] {
        assert!(host.loader.registry().is_ready(extension), "{extension} not loaded");
    }
    assert!(app.dependencies().skipped.is_empty());
}

#[tokio::test]
async fn test_extension_loads_do_not_move_active_app() {
    let host = voip_host(test_module())
        .with_module("apps/fax/app", test_module())
        .build();

    let voip = host.loader.load("voip").await.unwrap();
    assert_eq!(host.loader.active_app().as_deref(), Some("voip"));
    assert!(voip.is_active());
    assert!(!host.loader.registry().get("recorder").unwrap().is_active());

    let fax = host.loader.load("fax").await.unwrap();
    assert!(fax.is_active());
    assert!(!voip.is_active());

    let again = host.loader.load("voip").await.unwrap();
    assert!(Arc::ptr_eq(&voip, &again));
    assert!(voip.is_active());
    assert_eq!(host.resolver.resolution_count("apps/voip/app"), 1);
}

#[tokio::test]
async fn test_fatal_sub_module_failure_leaves_app_unregistered() {
    let stale = Counter::default();
    let host = voip_host(test_module().with_sub_module("calls").with_sub_module("history"))
        .with_module(
            "apps/voip/submodules/calls/calls",
            ModuleDefinition::new().subscribing("voip.refresh", HandlerRef::Inline(stale.handler())),
        )
        .build();
    let recorder = EventRecorder::attach(host.bus());

    let err = host.loader.load("voip").await.unwrap_err();

    assert!(matches!(err, AppError::ModuleResolution { ref app, .. } if app == "voip"));
    assert_eq!(host.loader.registry().state("voip"), AppState::Unregistered);
    assert_eq!(host.bus().registry().count_for_owner("voip"), 0);
    assert_eq!(recorder.count(topics::APP_READY), 0);
    assert_eq!(host.loader.active_app(), None);

    host.bus().publish("voip.refresh", json!({}));
    assert_eq!(stale.get(), 0);

    host.resolver.insert("apps/voip/submodules/history/history", ModuleDefinition::new());
    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(app.state(), AppState::Ready);
    assert_eq!(host.resolver.resolution_count("apps/voip/app"), 2);
    assert_eq!(host.bus().registry().count_for_owner("voip"), 1);
}

#[tokio::test]
async fn test_unknown_subscription_method_is_fatal() {
    let host = voip_host(
        test_module().subscribing("voip.refresh", HandlerRef::Method("missing".into())),
    )
    .build();

    let err = host.loader.load("voip").await.unwrap_err();

    assert!(matches!(err, AppError::UnknownHandler { ref method, .. } if method == "missing"));
    assert!(!host.loader.registry().contains("voip"));
}

#[tokio::test]
async fn test_missing_build_config_degrades() {
    let host = voip_host(test_module().with_config_file()).build();
    let recorder = EventRecorder::attach(host.bus());

    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(*app.build_config(), json!({}));
    assert!(matches!(
        app.degradations(),
        [Degradation::ConfigUnavailable { .. }]
    ));
    let starts = recorder.payloads(topics::REQUEST_START);
    assert!(starts.contains(&json!({"url": "apps/voip/app-build-config.json"})));
    assert_eq!(
        recorder.count(topics::REQUEST_START),
        recorder.count(topics::REQUEST_END)
    );

    let ready = recorder.payloads(topics::APP_READY);
    let voip = ready.iter().find(|p| p["app"] == "voip").unwrap();
    assert_eq!(voip["degradations"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_pro_build_loads_pro_sub_module() {
    let host = voip_host(test_module().with_config_file())
        .with_module(
            "apps/voip/submodules/pro/pro",
            ModuleDefinition::new().with_state(json!({"tier": "pro"})),
        )
        .with_assets(
            MockAssetFetcher::new()
                .with_json("apps/voip/app-build-config.json", json!({"version": "pro"})),
        )
        .build();

    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(app.build_config()["version"], "pro");
    assert_eq!(app.module().sub_modules, ["pro"]);
    assert_eq!(app.data()["tier"], "pro");
}

#[tokio::test]
async fn test_installed_app_redirects_code_and_calls() {
    let mut auth = test_auth_state(test_user());
    auth.installed_apps.push(
        InstalledApp::new("voip")
            .with_source_url("https://cdn.example.com/voip")
            .with_api_url("https://api.example.com/v2"),
    );
    let host = TestHost::builder()
        .with_auth(auth)
        .with_module("https://cdn.example.com/voip/app", test_module())
        .build();

    let app = host.loader.load("voip").await.unwrap();
    app.call_api(RequestIntent::new("account.get")).await.unwrap();

    assert_eq!(app.app_path(), "https://cdn.example.com/voip/");
    let sent = host.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].settings.api_root, "https://api.example.com/v2/");
    assert_eq!(sent[0].settings.ui_metadata.origin, "voip");
    assert_eq!(sent[0].settings.auth_token.as_deref(), Some("test-token"));
}

#[tokio::test]
async fn test_default_api_url_from_config() {
    let mut config = Config::default();
    config.api.default_url = "https://api.internal/v2/".to_string();
    let host = TestHost::builder()
        .with_config(config)
        .with_auth(AuthState::default())
        .with_module("apps/voip/app", test_module())
        .build();

    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(app.api_url(), "https://api.internal/v2/");
    assert_eq!(app.auth_token(), None);
}

#[tokio::test]
async fn test_shortcuts_published_on_every_load() {
    let host = voip_host(
        test_module()
            .with_shortcut("r", "voip.refresh")
            .with_shortcut("d", "voip.dial"),
    )
    .with_assets(MockAssetFetcher::new().with_json(
        "apps/voip/i18n/en-US.json",
        json!({"shortcuts": {"r": "Refresh calls"}}),
    ))
    .build();
    let recorder = EventRecorder::attach(host.bus());

    host.loader.load("voip").await.unwrap();
    host.loader.load("voip").await.unwrap();

    let published = recorder.payloads(topics::SHORTCUTS_CHANGED);
    assert_eq!(published.len(), 2);
    assert_eq!(
        published[0],
        json!({
            "category": "appSpecific",
            "app": "voip",
            "shortcuts": [
                {"key": "alt+d", "topic": "voip.dial", "title": "voip.dial"},
                {"key": "alt+r", "topic": "voip.refresh", "title": "Refresh calls"},
            ],
        })
    );
}

#[tokio::test]
async fn test_on_load_runs_once() {
    let calls = Counter::default();
    let seen = calls.clone();
    let host = voip_host(test_module().on_load(Arc::new(move |app| {
        assert_eq!(app.name(), "voip");
        seen.bump();
    })))
    .build();

    host.loader.load("voip").await.unwrap();
    host.loader.load("voip").await.unwrap();

    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn test_stylesheets_include_language_sheet() {
    let mut config = Config::default();
    config.host.language = Some("fr-fr".to_string());
    let host = voip_host(
        test_module()
            .with_language("fr-FR", true)
            .with_css("app"),
    )
    .with_config(config)
    .build();

    host.loader.load("voip").await.unwrap();

    let mut sheets: Vec<_> = host
        .assets
        .stylesheets()
        .into_iter()
        .filter(|s| s.starts_with("apps/voip/"))
        .collect();
    sheets.sort();
    assert_eq!(
        sheets,
        ["apps/voip/style/app.css", "apps/voip/style/cssI18n/fr-FR.css"]
    );
}

#[tokio::test]
async fn test_preloaded_apps_skip_stylesheets() {
    let mut config = Config::default();
    config.build.preloaded_apps = vec!["voip".to_string()];
    let host = voip_host(test_module().with_css("app"))
        .with_config(config)
        .build();

    host.loader.load("voip").await.unwrap();

    assert!(host.assets.stylesheets().is_empty());
}

#[tokio::test]
async fn test_preloaded_apps_still_request_language_sheet() {
    let mut config = Config::default();
    config.build.preloaded_apps = vec!["voip".to_string()];
    config.host.language = Some("fr-fr".to_string());
    let host = voip_host(
        test_module()
            .with_language("fr-FR", true)
            .with_css("app"),
    )
    .with_config(config)
    .build();

    host.loader.load("voip").await.unwrap();

    let sheets: Vec<_> = host
        .assets
        .stylesheets()
        .into_iter()
        .filter(|s| s.starts_with("apps/voip/"))
        .collect();
    assert_eq!(sheets, ["apps/voip/style/cssI18n/fr-FR.css"]);
}

#[tokio::test]
async fn test_failed_script_degrades() {
    let host = voip_host(
        test_module()
            .with_external_script("dialer")
            .with_external_script("charts"),
    )
    .with_assets(MockAssetFetcher::new().with_failure("apps/voip/external/dialer.js"))
    .build();

    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(app.state(), AppState::Ready);
    assert_eq!(host.assets.scripts(), ["apps/voip/external/charts.js"]);
    assert!(matches!(
        app.degradations(),
        [Degradation::DependencyFailed { dependency, .. }] if dependency == "script:dialer"
    ));
    assert!(host.loader.registry().is_ready("recorder"));
}

#[tokio::test]
async fn test_core_translations_absorbed() {
    let host = voip_host(test_module())
        .with_module("apps/core/app", test_module())
        .with_assets(
            MockAssetFetcher::new()
                .with_json(
                    "apps/core/i18n/en-US.json",
                    json!({"hello": "core", "common": {"save": "Save"}}),
                )
                .with_json(
                    "apps/voip/i18n/en-US.json",
                    json!({"hello": "voip", "title": "Phone"}),
                ),
        )
        .build();

    host.loader.load("core").await.unwrap();
    let app = host.loader.load("voip").await.unwrap();

    let bundle = app.i18n();
    assert_eq!(bundle["hello"], "core");
    assert_eq!(bundle["title"], "Phone");
    assert_eq!(bundle["common"]["save"], "Save");
}

fn french() -> Config {
    let mut config = Config::default();
    config.host.language = Some("fr-FR".to_string());
    config
}

#[tokio::test]
async fn test_core_translations_absorbed_in_preferred_language() {
    let host = voip_host(test_module().with_language("fr-FR", false))
        .with_module("apps/core/app", test_module().with_language("fr-FR", false))
        .with_config(french())
        .with_assets(
            MockAssetFetcher::new()
                .with_json("apps/core/i18n/en-US.json", json!({"save": "Save"}))
                .with_json("apps/core/i18n/fr-FR.json", json!({"save": "Enregistrer"}))
                .with_json(
                    "apps/voip/i18n/en-US.json",
                    json!({"title": "Phone", "dial": "Dial"}),
                )
                .with_json("apps/voip/i18n/fr-FR.json", json!({"title": "Téléphone"})),
        )
        .build();

    host.loader.load("core").await.unwrap();
    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(
        *app.i18n(),
        json!({"title": "Téléphone", "dial": "Dial", "save": "Enregistrer"})
    );
}

#[tokio::test]
async fn test_core_translations_for_undeclared_language_keep_app_keys() {
    let host = voip_host(test_module())
        .with_module("apps/core/app", test_module().with_language("fr-FR", false))
        .with_config(french())
        .with_assets(
            MockAssetFetcher::new()
                .with_json("apps/core/i18n/en-US.json", json!({"save": "Save"}))
                .with_json("apps/core/i18n/fr-FR.json", json!({"save": "Enregistrer"}))
                .with_json("apps/voip/i18n/en-US.json", json!({"title": "Phone"})),
        )
        .build();

    host.loader.load("core").await.unwrap();
    let app = host.loader.load("voip").await.unwrap();

    assert_eq!(*app.i18n(), json!({"title": "Phone", "save": "Save"}));
    assert!(app.degradations().contains(&Degradation::LocaleUnavailable {
        language: "fr-FR".into(),
    }));
    assert!(!app.locales().is_loaded("fr-FR"));
}
