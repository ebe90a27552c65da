//! Named sub-blocks of the merged configuration: `libs.<name>` and
//! `modules.<name>`.

use super::fragment::Fragment;
use super::merge::deep_merge;
use serde_json::Value;

/// Merge `<scope>.<name>` across a chain, later fragments winning.
///
/// Each fragment that declares the entry contributes its whole sub-value.
/// Returns `None` when no fragment declares it.
pub fn merge_scope(chain: &[Fragment], scope: &str, name: &str) -> Option<Value> {
    chain
        .iter()
        .filter_map(|fragment| match fragment.get(scope) {
            Some(Value::Object(entries)) => entries.get(name),
            _ => None,
        })
        .cloned()
        .reduce(deep_merge)
}

/// Directory-like `path` entry of a library block, if it has one.
pub fn library_path(value: &Value) -> Option<&str> {
    value.get("path").and_then(Value::as_str)
}
