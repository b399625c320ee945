//! Whitelabel document tracking.

use std::sync::{PoisonError, RwLock};

use mosaic_core::deep_merge;
use mosaic_events::{EventBus, topics};
use serde_json::{Map, Value};
use tracing::debug;

/// The host's whitelabel document, merged from matching API responses.
#[derive(Debug)]
pub struct WhitelabelState {
    doc: RwLock<Value>,
}

impl WhitelabelState {
    /// Start from `initial` (usually `{}`).
    #[must_use]
    pub fn new(initial: Value) -> Self {
        Self {
            doc: RwLock::new(initial),
        }
    }

    /// Current document.
    #[must_use]
    pub fn get(&self) -> Value {
        self.doc
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Deep-merge `overlay` into the document and return the result.
    pub fn merge(&self, overlay: &Value) -> Value {
        let mut doc = self.doc.write().unwrap_or_else(PoisonError::into_inner);
        deep_merge(&mut doc, overlay);
        doc.clone()
    }
}

impl Default for WhitelabelState {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

/// Merge a whitelabel response into `state` when its domain is the host's.
pub(crate) fn sync(doc: &Value, host_domain: Option<&str>, state: &WhitelabelState, bus: &EventBus) {
    let Some(host_domain) = host_domain else {
        return;
    };
    let Some(domain) = doc.get("domain").and_then(Value::as_str) else {
        return;
    };
    if domain.to_lowercase() != host_domain.to_lowercase() {
        debug!(domain, "Whitelabel document for another domain ignored");
        return;
    }

    let mut overlay = doc.clone();
    if let Some(fields) = overlay.as_object_mut()
        && let Some(company) = fields.get("company_name").cloned()
    {
        fields.insert("companyName".to_string(), company);
    }

    let merged = state.merge(&overlay);
    bus.publish(topics::WHITELABEL_UPDATED, merged);
    debug!(domain, "Whitelabel state updated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_matching_domain_merged_with_alias() {
        let state = WhitelabelState::new(json!({"companyName": "Default", "nav": {"help": "x"}}));
        let bus = EventBus::new();
        let mut rx = bus.subscribe_topic(topics::WHITELABEL_UPDATED);

        sync(
            &json!({"domain": "Portal.Example.com", "company_name": "Acme", "nav": {"logout": "y"}}),
            Some("portal.example.com"),
            &state,
            &bus,
        );

        let doc = state.get();
        assert_eq!(doc["companyName"], "Acme");
        assert_eq!(doc["nav"], json!({"help": "x", "logout": "y"}));
        assert_eq!(rx.drain().len(), 1);
    }

    #[test]
    fn test_other_domain_ignored() {
        let state = WhitelabelState::default();
        let bus = EventBus::new();

        sync(&json!({"domain": "other.com", "company_name": "X"}), Some("portal.example.com"), &state, &bus);
        sync(&json!({"company_name": "X"}), Some("portal.example.com"), &state, &bus);
        sync(&json!({"domain": "portal.example.com"}), None, &state, &bus);

        assert_eq!(state.get(), json!({}));
    }
}
