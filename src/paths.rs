//! Lexical path resolution for level keys and scope directories.
//!
//! Pure path manipulation: nothing here touches the filesystem, so a level
//! key that names a directory which does not exist yet still resolves.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` unless it is already absolute, then
/// normalize the result.
pub fn resolve(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Remove `.` components and fold `..` into its parent.
///
/// A `..` that would climb above the root (or above the start of a
/// relative path) is kept as-is.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                } else if !matches!(components.last(), Some(Component::RootDir)) {
                    components.push(Component::ParentDir);
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }
    components.iter().collect()
}

/// Directory a fragment was declared in, derived from its source file.
pub fn source_dir(source: &Path) -> PathBuf {
    source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Current working directory, or `.` when it cannot be determined.
pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
