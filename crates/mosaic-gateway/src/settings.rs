//! Host settings the gateway stamps on every call.

use mosaic_config::Config;

/// Settings derived from host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Default API root.
    pub api_root: String,
    /// UI version stamped in call metadata.
    pub version: String,
    /// UI name stamped in call metadata.
    pub ui_name: String,
    /// Cluster id sent as a header, if configured.
    pub cluster_id: Option<String>,
    /// Name of the cluster id header.
    pub cluster_header: String,
    /// Accept charges without prompting.
    pub accept_charges: bool,
    /// Veto billing calls.
    pub disable_billing: bool,
    /// Host domain matched against whitelabel documents.
    pub domain: Option<String>,
}

impl GatewaySettings {
    /// Derive settings from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_root: config.api.default_url.clone(),
            version: config.host.version.clone(),
            ui_name: config.host.ui_name.clone(),
            cluster_id: config.api.cluster_id.clone(),
            cluster_header: config.api.cluster_header.clone(),
            accept_charges: config.whitelabel.auto_accept_charges,
            disable_billing: config.features.disable_billing,
            domain: config.host.domain.clone(),
        }
    }

    /// Set the default API root.
    #[must_use]
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Set the cluster id.
    #[must_use]
    pub fn with_cluster_id(mut self, cluster_id: impl Into<String>) -> Self {
        self.cluster_id = Some(cluster_id.into());
        self
    }

    /// Enable or disable the billing veto.
    #[must_use]
    pub fn with_billing_disabled(mut self, disabled: bool) -> Self {
        self.disable_billing = disabled;
        self
    }

    /// Set the host domain.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.api.cluster_id = Some("cluster-7".into());
        config.features.disable_billing = true;
        config.whitelabel.auto_accept_charges = true;

        let settings = GatewaySettings::from_config(&config);

        assert_eq!(settings.api_root, config.api.default_url);
        assert_eq!(settings.cluster_id.as_deref(), Some("cluster-7"));
        assert_eq!(settings.cluster_header, "X-Kazoo-Cluster-ID");
        assert!(settings.disable_billing);
        assert!(settings.accept_charges);
    }
}
