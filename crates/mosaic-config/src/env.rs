//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `MOSAIC_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "MOSAIC_DEFAULT_LANGUAGE",
        field_path: "host.default_language",
    },
    EnvMapping {
        var_name: "MOSAIC_LANGUAGE",
        field_path: "host.language",
    },
    EnvMapping {
        var_name: "MOSAIC_CORE_APP",
        field_path: "host.core_app",
    },
    EnvMapping {
        var_name: "MOSAIC_DOMAIN",
        field_path: "host.domain",
    },
    EnvMapping {
        var_name: "MOSAIC_API_URL",
        field_path: "api.default_url",
    },
    EnvMapping {
        var_name: "MOSAIC_CLUSTER_ID",
        field_path: "api.cluster_id",
    },
    EnvMapping {
        var_name: "MOSAIC_DISABLE_BILLING",
        field_path: "features.disable_billing",
    },
    EnvMapping {
        var_name: "MOSAIC_AUTO_ACCEPT_CHARGES",
        field_path: "whitelabel.auto_accept_charges",
    },
    EnvMapping {
        var_name: "MOSAIC_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "MOSAIC_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources
            .get(mapping.field_path)
            .is_some_and(ConfigLayer::is_file)
        {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );

            set_field_from_string(merged, mapping.field_path, val);
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set a field in the TOML tree from a string value, creating intermediate
/// tables as needed.
fn set_field_from_string(root: &mut toml::Value, path: &str, val: &str) {
    let toml_val = coerce_to_toml_value(path, val);

    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), toml_val);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), toml_val);
    }
}

/// Coerce a string env var value to the TOML type of the field.
fn coerce_to_toml_value(path: &str, val: &str) -> toml::Value {
    if matches!(
        path,
        "features.disable_billing" | "whitelabel.auto_accept_charges"
    ) && let Ok(b) = val.parse::<bool>()
    {
        return toml::Value::Boolean(b);
    }

    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
