//! JSON deep-merge helpers.
//!
//! Used for sub-module state composition, locale bundle overlays, and
//! whitelabel document updates.

use serde_json::Value;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Objects merge recursively per-key.
/// - Scalars and arrays from the overlay **replace** the base value.
/// - A `null` overlay value replaces the base value as well.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                if let Some(base_val) = base_map.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_map.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Fold `layers` left to right onto an empty object and return the result.
///
/// Later layers win on key collision.
#[must_use]
pub fn deep_merged<'a>(layers: impl IntoIterator<Item = &'a Value>) -> Value {
    let mut merged = Value::Object(serde_json::Map::new());
    for layer in layers {
        deep_merge(&mut merged, layer);
    }
    merged
}
