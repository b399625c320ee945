//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_host(config)?;
    validate_api(config)?;
    validate_logging(config)?;
    validate_gateway(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_host(config: &Config) -> ConfigResult<()> {
    let h = &config.host;

    if h.default_language.trim().is_empty() {
        return Err(invalid("host.default_language", "must not be empty"));
    }

    if h.language.as_deref().is_some_and(|l| l.trim().is_empty()) {
        return Err(invalid("host.language", "must not be empty when set"));
    }

    if h.core_app.trim().is_empty() {
        return Err(invalid("host.core_app", "must not be empty"));
    }

    Ok(())
}

fn validate_api(config: &Config) -> ConfigResult<()> {
    let a = &config.api;

    if !(a.default_url.starts_with("http://") || a.default_url.starts_with("https://")) {
        return Err(invalid(
            "api.default_url",
            format!("'{}' must be an http(s) URL", a.default_url),
        ));
    }

    if a.cluster_header.trim().is_empty() {
        return Err(invalid("api.cluster_header", "must not be empty"));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        ));
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        ));
    }

    Ok(())
}

/// Hook keys must look like `<module>.<method>`. Hook names are checked by
/// the gateway, which owns the hook catalog.
fn validate_gateway(config: &Config) -> ConfigResult<()> {
    for (resource, hook) in &config.gateway.hooks {
        let well_formed = resource
            .split_once('.')
            .is_some_and(|(m, f)| !m.is_empty() && !f.is_empty() && !f.contains('.'));
        if !well_formed {
            return Err(invalid(
                "gateway.hooks",
                format!("'{resource}' is not a <module>.<method> resource id"),
            ));
        }
        if hook.trim().is_empty() {
            return Err(invalid(
                "gateway.hooks",
                format!("hook for '{resource}' must not be empty"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_api_url() {
        let mut config = Config::default();
        config.api.default_url = "ftp://example".to_owned();
        let err = validate(&config).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "api.default_url")
        );
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_owned();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_malformed_hook_key() {
        let mut config = Config::default();
        config
            .gateway
            .hooks
            .insert("billing".to_owned(), "billing_guard".to_owned());
        assert!(validate(&config).is_err());

        config.gateway.hooks.clear();
        config
            .gateway
            .hooks
            .insert("billing.get".to_owned(), "passthrough".to_owned());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_rejects_empty_language() {
        let mut config = Config::default();
        config.host.language = Some("  ".to_owned());
        assert!(validate(&config).is_err());
    }
}
