//! Layered configuration driving a live host.

mod common;

use common::voip_host;
use mosaic_config::{Config, ConfigLayer};
use mosaic_gateway::{GatewayError, RequestIntent};
use mosaic_telemetry::{LogConfig, LogFormat};
use mosaic_test::{test_dir, test_file_in_dir, test_module};
use tempfile::TempDir;

struct Layers {
    home: TempDir,
    workspace: TempDir,
}

impl Layers {
    fn new(user: &str, workspace: &str) -> Self {
        let home = test_dir();
        test_file_in_dir(&home, "config.toml", user);
        let ws = test_dir();
        test_file_in_dir(&ws, ".mosaic/config.toml", workspace);
        Self {
            home,
            workspace: ws,
        }
    }

    fn load(&self) -> mosaic_config::ResolvedConfig {
        Config::load_with_home(Some(self.workspace.path()), self.home.path()).unwrap()
    }
}

const USER: &str = r#"
[api]
default_url = "https://user.example.com/v2/"

[features]
disable_billing = true

[logging]
format = "json"
"#;

const WORKSPACE: &str = r#"
[api]
default_url = "https://workspace.example.com/v2/"

[gateway.hooks]
"billing.get" = "passthrough"
"#;

#[test]
fn test_workspace_layer_wins() {
    let resolved = Layers::new(USER, WORKSPACE).load();

    assert_eq!(
        resolved.config.api.default_url,
        "https://workspace.example.com/v2/"
    );
    assert!(resolved.config.features.disable_billing);
    assert_eq!(
        resolved.field_sources.get("api.default_url"),
        Some(&ConfigLayer::Workspace)
    );
    assert_eq!(
        resolved.field_sources.get("features.disable_billing"),
        Some(&ConfigLayer::User)
    );
    assert!(resolved.loaded_files.len() >= 2);
}

#[tokio::test]
async fn test_loaded_config_drives_apps_and_hooks() {
    let config = Layers::new(USER, WORKSPACE).load().config;
    let host = voip_host(test_module()).with_config(config).build();

    let app = host.loader.load("voip").await.unwrap();
    assert_eq!(app.api_url(), "https://workspace.example.com/v2/");

    app.call_api(RequestIntent::new("billing.get")).await.unwrap();
    let err = app
        .call_api(RequestIntent::new("billing.update"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Vetoed { .. }));
    assert_eq!(host.transport.sent_resources(), ["billing.get"]);
}

#[test]
fn test_logging_section_feeds_log_config() {
    let config = Layers::new(USER, WORKSPACE).load().config;

    let log = LogConfig::from_config(&config.logging).unwrap();

    assert_eq!(log.format, LogFormat::Json);
}
