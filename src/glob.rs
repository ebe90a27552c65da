//! Directory pattern expansion for wildcard level keys.
//!
//! The resolver only needs "which directories under `base` match this
//! pattern", so the primitive is a trait. [`FsGlobMatcher`] answers it from
//! disk; [`StaticGlobMatcher`] answers it from a fixed table.

use crate::error::{ConfigError, Result};
use crate::paths;
use async_trait::async_trait;
use globset::GlobBuilder;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Characters that turn a level key into a pattern.
const WILDCARD_CHARS: &[char] = &['*', '?', '[', '{'];

/// Whether a level key must be expanded by a [`GlobMatcher`].
pub fn is_pattern(key: &str) -> bool {
    key.contains(WILDCARD_CHARS)
}

/// Expands a directory pattern into concrete absolute directories.
///
/// Results must be deterministic for a fixed filesystem snapshot. Both
/// forms must return the same directories.
#[async_trait]
pub trait GlobMatcher: Send + Sync {
    /// Directories under `base` matching `pattern`, in a stable order.
    fn match_dirs(&self, pattern: &str, base: &Path) -> Result<Vec<PathBuf>>;

    /// Async form of [`GlobMatcher::match_dirs`].
    async fn match_dirs_async(&self, pattern: &str, base: &Path) -> Result<Vec<PathBuf>> {
        self.match_dirs(pattern, base)
    }
}

/// Matches patterns against the directories on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsGlobMatcher;

impl FsGlobMatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GlobMatcher for FsGlobMatcher {
    fn match_dirs(&self, pattern: &str, base: &Path) -> Result<Vec<PathBuf>> {
        walk_matches(pattern, base)
    }

    async fn match_dirs_async(&self, pattern: &str, base: &Path) -> Result<Vec<PathBuf>> {
        let pattern = pattern.to_string();
        let base = base.to_path_buf();
        tokio::task::spawn_blocking(move || walk_matches(&pattern, &base)).await?
    }
}

/// Split a pattern into its literal directory prefix and the wildcard tail.
///
/// `blocks/*/desktop.*` under `/p` walks from `/p/blocks` with the tail
/// `*/desktop.*`.
fn split_pattern(pattern: &str, base: &Path) -> (PathBuf, String) {
    let mut root = if Path::new(pattern).is_absolute() {
        PathBuf::from("/")
    } else {
        base.to_path_buf()
    };

    let mut tail = Vec::new();
    for component in Path::new(pattern).components() {
        let part = component.as_os_str().to_string_lossy();
        match component {
            Component::Normal(_) | Component::CurDir | Component::ParentDir
                if tail.is_empty() && !is_pattern(&part) =>
            {
                root.push(component.as_os_str());
            }
            Component::Prefix(_) | Component::RootDir => {}
            _ => tail.push(part.into_owned()),
        }
    }

    (paths::normalize(&root), tail.join("/"))
}

fn walk_matches(pattern: &str, base: &Path) -> Result<Vec<PathBuf>> {
    let (root, tail) = split_pattern(pattern, base);

    if tail.is_empty() {
        // Pattern had no wildcard component after all
        return Ok(if root.is_dir() { vec![root] } else { Vec::new() });
    }

    let glob = GlobBuilder::new(&tail)
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::glob(pattern, base, e))?
        .compile_matcher();

    if !root.is_dir() {
        debug!(pattern, root = %root.display(), "Pattern root does not exist");
        return Ok(Vec::new());
    }

    let mut walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name();
    if !tail.contains("**") {
        walker = walker.max_depth(tail.split('/').count());
    }

    let mut matches = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Only an unreadable pattern root fails the expansion
            Err(e) if e.depth() == 0 => return Err(ConfigError::glob(pattern, base, e)),
            Err(e) if e.loop_ancestor().is_some() => {
                debug!(pattern, error = %e, "Skipping symlink loop");
                continue;
            }
            Err(e) => {
                warn!(pattern, error = %e, "Skipping unreadable directory");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if glob.is_match(relative.as_str()) {
            matches.push(entry.path().to_path_buf());
        }
    }

    matches.sort();
    debug!(
        pattern,
        base = %base.display(),
        matches = matches.len(),
        "Expanded level pattern"
    );
    Ok(matches)
}

/// Fixed pattern table, for tests and embedders that already know the
/// directory layout.
///
/// Relative results are resolved against the `base` passed by the caller.
/// Unknown patterns match nothing.
#[derive(Debug, Clone, Default)]
pub struct StaticGlobMatcher {
    table: HashMap<String, Vec<PathBuf>>,
}

impl StaticGlobMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the directories a pattern expands to.
    pub fn with(
        mut self,
        pattern: impl Into<String>,
        dirs: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> Self {
        self.table
            .insert(pattern.into(), dirs.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl GlobMatcher for StaticGlobMatcher {
    fn match_dirs(&self, pattern: &str, base: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .table
            .get(pattern)
            .map(|dirs| dirs.iter().map(|dir| paths::resolve(base, dir)).collect())
            .unwrap_or_default())
    }
}
