//! Deep merge of configuration values.
//!
//! Implements right-biased merging where later values override earlier ones.
//! Arrays are replaced entirely, not concatenated.

use super::fragment::{Fragment, ROOT_KEY, SOURCE_KEY};
use serde_json::{Map, Value};

/// Deep merge two JSON values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Keys missing from overlay keep their base value
/// - Arrays, strings, numbers, booleans and nulls are replaced entirely
/// - A type mismatch at the same key resolves to the overlay value
///
/// # Example
/// ```
/// use serde_json::json;
/// use cascade_config::config::deep_merge;
///
/// let base = json!({
///     "levels": { "blocks": { "scheme": "nested", "techs": ["css"] } }
/// });
/// let overlay = json!({
///     "levels": { "blocks": { "techs": ["js"] } }
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(
///     result,
///     json!({ "levels": { "blocks": { "scheme": "nested", "techs": ["js"] } } })
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both are objects: merge recursively
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            Value::Object(merge_maps(base_map, overlay_map))
        }
        // Any other case: overlay replaces base entirely
        (_, overlay) => overlay,
    }
}

/// Merge two mappings key by key.
pub fn merge_maps(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    for (key, overlay_value) in overlay {
        let merged_value = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged_value);
    }
    base
}

/// Merge multiple values in order, with later values taking precedence.
///
/// Folds `deep_merge` over the list starting from an empty object, so an
/// empty input yields `{}`.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

/// Merge the payloads of a fragment chain.
///
/// Fragment payloads never hold metadata keys, so the result is a clean
/// merged configuration.
pub fn merge_fragments(fragments: &[Fragment]) -> Value {
    deep_merge_all(
        fragments
            .iter()
            .map(|fragment| Value::Object(fragment.data.clone())),
    )
}

/// Drop top-level `__source` and `root` keys from a raw value.
pub fn strip_metadata(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            map.remove(SOURCE_KEY);
            map.remove(ROOT_KEY);
            Value::Object(map)
        }
        other => other,
    }
}
