//! Migration away from the provider-specific `dash_e911` field.

use serde_json::{Map, Value};

const LEGACY_FIELD: &str = "dash_e911";
const CANONICAL_FIELD: &str = "e911";

/// Outgoing body: drop the legacy field, keeping its value as the
/// canonical one only when the canonical field is absent.
pub(crate) fn migrate_request(body: &mut Map<String, Value>) {
    let Some(legacy) = body.remove(LEGACY_FIELD) else {
        return;
    };
    body.entry(CANONICAL_FIELD).or_insert(legacy);
}

/// Incoming document: rename the legacy field when the canonical one is
/// absent. A document carrying both is left untouched.
pub(crate) fn migrate_response(doc: &mut Value) {
    let Some(doc) = doc.as_object_mut() else {
        return;
    };
    if doc.contains_key(CANONICAL_FIELD) {
        return;
    }
    if let Some(legacy) = doc.remove(LEGACY_FIELD) {
        doc.insert(CANONICAL_FIELD.to_string(), legacy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_request_legacy_only() {
        let mut body = object(json!({"dash_e911": {"street": "Main"}}));
        migrate_request(&mut body);
        assert_eq!(Value::Object(body), json!({"e911": {"street": "Main"}}));
    }

    #[test]
    fn test_request_both_keeps_canonical() {
        let mut body = object(json!({"dash_e911": {"street": "Old"}, "e911": {"street": "New"}}));
        migrate_request(&mut body);
        assert_eq!(Value::Object(body), json!({"e911": {"street": "New"}}));
    }

    #[test]
    fn test_response_rename() {
        let mut doc = json!({"id": "+1555", "dash_e911": {"street": "Main"}});
        migrate_response(&mut doc);
        assert_eq!(doc, json!({"id": "+1555", "e911": {"street": "Main"}}));

        let mut both = json!({"dash_e911": 1, "e911": 2});
        migrate_response(&mut both);
        assert_eq!(both, json!({"dash_e911": 1, "e911": 2}));
    }
}
