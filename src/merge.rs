//! Recursive Configuration Merge
//!
//! Objects deep-merge, arrays append without duplicates, scalars are
//! replaced by the overlay. Merging the same overlay twice yields the
//! same result as merging it once.

use serde_json::Value;

/// Merge `overlay` into `base` in place.
pub fn merge_into(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing)
                        if (existing.is_object() && value.is_object())
                            || (existing.is_array() && value.is_array()) =>
                    {
                        merge_into(existing, value);
                    }
                    _ => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (Value::Array(base_items), Value::Array(overlay_items)) => {
            for item in overlay_items {
                if !base_items.contains(item) {
                    base_items.push(item.clone());
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Merge `overlay` into a copy of `base` and return the result.
pub fn merged(base: &Value, overlay: &Value) -> Value {
    let mut result = base.clone();
    merge_into(&mut result, overlay);
    result
}
