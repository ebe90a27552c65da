//! Configuration fragments and their provenance.

use crate::error::{ConfigError, Result};
use crate::paths;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key carrying a fragment's source path in its serialized form.
pub const SOURCE_KEY: &str = "__source";

/// Key marking the fragment that starts the project cascade.
pub const ROOT_KEY: &str = "root";

/// Scope a fragment was discovered at (most general first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentOrigin {
    /// `defaults` construction option
    Defaults,
    /// System-wide rc file
    System,
    /// rc file in the user's home
    Home,
    /// rc file in the project root or one of its ancestors
    Project,
    /// File named by `pathToConfig`
    Explicit,
    /// `extendBy` construction option
    ExtendBy,
    /// Command-line overrides
    CommandLine,
    /// In-memory fragment (library views, embedding)
    Synthetic,
}

impl FragmentOrigin {
    /// Placeholder file name used as the source of fragments that were not
    /// read from disk.
    pub fn virtual_file_name(&self) -> &'static str {
        match self {
            FragmentOrigin::Defaults => "<defaults>",
            FragmentOrigin::ExtendBy => "<extend-by>",
            FragmentOrigin::CommandLine => "<argv>",
            _ => "<synthetic>",
        }
    }
}

impl std::fmt::Display for FragmentOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FragmentOrigin::Defaults => write!(f, "defaults"),
            FragmentOrigin::System => write!(f, "system"),
            FragmentOrigin::Home => write!(f, "home"),
            FragmentOrigin::Project => write!(f, "project"),
            FragmentOrigin::Explicit => write!(f, "explicit"),
            FragmentOrigin::ExtendBy => write!(f, "extend-by"),
            FragmentOrigin::CommandLine => write!(f, "command-line"),
            FragmentOrigin::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// One raw configuration object plus where it came from.
///
/// `data` never contains the `__source` or `root` keys; they live in
/// dedicated fields and are re-attached only when the fragment is
/// serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Absolute path of the file this fragment was read from.
    pub source: PathBuf,
    /// Scope the fragment was discovered at.
    pub origin: FragmentOrigin,
    /// Raw `root` marker as written, if any.
    pub root: Option<Value>,
    /// Configuration payload.
    pub data: Map<String, Value>,
}

/// Ordered fragments, general to specific. Later fragments win.
pub type FragmentChain = Vec<Fragment>;

impl Fragment {
    /// Build a fragment from a parsed document.
    ///
    /// Fails when the document is not a mapping.
    pub fn from_value(
        source: impl Into<PathBuf>,
        origin: FragmentOrigin,
        value: Value,
    ) -> Result<Self> {
        let source = source.into();
        match value {
            Value::Object(map) => Ok(Self::from_map(source, origin, map)),
            other => Err(ConfigError::InvalidFragment {
                path: source,
                found: value_kind(&other),
            }),
        }
    }

    /// Build a fragment from a mapping, lifting metadata keys out of it.
    pub fn from_map(
        source: impl Into<PathBuf>,
        origin: FragmentOrigin,
        mut data: Map<String, Value>,
    ) -> Self {
        data.remove(SOURCE_KEY);
        let root = data.remove(ROOT_KEY);
        Self {
            source: source.into(),
            origin,
            root,
            data,
        }
    }

    /// Fragment that did not come from a file; its source is a placeholder
    /// inside `dir` so that relative level keys resolve against `dir`.
    pub fn in_memory(dir: &Path, origin: FragmentOrigin, value: Value) -> Result<Self> {
        Self::from_value(dir.join(origin.virtual_file_name()), origin, value)
    }

    /// True only when the `root` marker is exactly boolean `true`.
    pub fn is_root(&self) -> bool {
        matches!(self.root, Some(Value::Bool(true)))
    }

    /// Directory the fragment was declared in.
    pub fn dir(&self) -> PathBuf {
        paths::source_dir(&self.source)
    }

    /// Get a top-level value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Serialize back to the raw shape, with `__source` and `root`.
    pub fn to_value(&self) -> Value {
        let mut map = self.data.clone();
        map.insert(
            SOURCE_KEY.to_string(),
            Value::String(self.source.to_string_lossy().into_owned()),
        );
        if let Some(ref root) = self.root {
            map.insert(ROOT_KEY.to_string(), root.clone());
        }
        Value::Object(map)
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = 1 + usize::from(self.root.is_some());
        let mut map = serializer.serialize_map(Some(self.data.len() + extra))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        if let Some(ref root) = self.root {
            map.serialize_entry(ROOT_KEY, root)?;
        }
        map.serialize_entry(SOURCE_KEY, &self.source)?;
        map.end()
    }
}

/// Short name of a JSON value's type, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}
