//! Level resolution: directory-scoped overrides keyed by path or pattern.
//!
//! Resolution runs in three phases so that blocking and async callers share
//! all of the merge logic:
//!
//! 1. [`plan`] walks the (truncated) chain and records every level
//!    declaration together with the sibling fields of its fragment.
//! 2. The caller expands pattern keys through a [`GlobMatcher`], either
//!    with [`expand`] or [`expand_async`].
//! 3. [`assemble`] merges the declarations into a [`LevelMap`].

use super::fragment::Fragment;
use super::merge::deep_merge;
use crate::error::Result;
use crate::glob::{GlobMatcher, is_pattern};
use crate::paths;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level key holding level declarations.
pub const LEVELS_KEY: &str = "levels";
/// Top-level key holding library scopes.
pub const LIBS_KEY: &str = "libs";
/// Top-level key holding module blocks.
pub const MODULES_KEY: &str = "modules";

/// Resolved absolute directory → merged level configuration.
pub type LevelMap = BTreeMap<PathBuf, Value>;

/// Where a level declaration applies.
#[derive(Debug, Clone, PartialEq)]
pub enum LevelTarget {
    /// A single directory, already absolute and normalized.
    Path(PathBuf),
    /// A wildcard key to expand under `base`.
    Pattern { pattern: String, base: PathBuf },
}

/// One `levels.<key>` entry of one fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelDecl {
    pub target: LevelTarget,
    /// Sibling fields of the declaring fragment merged with the level value.
    pub value: Value,
}

/// Top-level fields of a fragment that are not scopes of their own.
pub fn sibling_fields(fragment: &Fragment) -> Map<String, Value> {
    fragment
        .data
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), LEVELS_KEY | LIBS_KEY | MODULES_KEY))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Collect level declarations from a chain, in chain order.
///
/// Non-mapping `levels` blocks are ignored.
pub fn plan(chain: &[Fragment]) -> Vec<LevelDecl> {
    let mut decls = Vec::new();

    for fragment in chain {
        let Some(Value::Object(levels)) = fragment.get(LEVELS_KEY) else {
            continue;
        };
        if levels.is_empty() {
            continue;
        }

        let base = fragment.dir();
        let siblings = sibling_fields(fragment);

        for (key, level) in levels {
            let target = if is_pattern(key) {
                LevelTarget::Pattern {
                    pattern: key.clone(),
                    base: base.clone(),
                }
            } else {
                LevelTarget::Path(paths::resolve(&base, key))
            };
            let value = deep_merge(Value::Object(siblings.clone()), level.clone());
            decls.push(LevelDecl { target, value });
        }
    }

    decls
}

/// Expand every pattern declaration with a blocking matcher.
///
/// Returns one directory list per declaration, aligned with `decls`.
pub fn expand(decls: &[LevelDecl], matcher: &dyn GlobMatcher) -> Result<Vec<Vec<PathBuf>>> {
    decls
        .iter()
        .map(|decl| match decl.target {
            LevelTarget::Path(ref path) => Ok(vec![path.clone()]),
            LevelTarget::Pattern {
                ref pattern,
                ref base,
            } => matcher.match_dirs(pattern, base),
        })
        .collect()
}

/// Async form of [`expand`]; patterns are expanded one after another.
pub async fn expand_async(
    decls: &[LevelDecl],
    matcher: &dyn GlobMatcher,
) -> Result<Vec<Vec<PathBuf>>> {
    let mut expansions = Vec::with_capacity(decls.len());
    for decl in decls {
        let dirs = match decl.target {
            LevelTarget::Path(ref path) => vec![path.clone()],
            LevelTarget::Pattern {
                ref pattern,
                ref base,
            } => matcher.match_dirs_async(pattern, base).await?,
        };
        expansions.push(dirs);
    }
    Ok(expansions)
}

/// Merge declarations into a level map; later declarations win per path.
pub fn assemble(decls: Vec<LevelDecl>, expansions: Vec<Vec<PathBuf>>) -> LevelMap {
    let mut map = LevelMap::new();

    for (decl, dirs) in decls.into_iter().zip(expansions) {
        if let LevelTarget::Pattern { ref pattern, .. } = decl.target {
            debug!(pattern = %pattern, matches = dirs.len(), "Level pattern resolved");
        }
        for dir in dirs {
            let dir = paths::normalize(&dir);
            let merged = match map.remove(&dir) {
                Some(existing) => deep_merge(existing, decl.value.clone()),
                None => decl.value.clone(),
            };
            map.insert(dir, merged);
        }
    }

    map
}

/// Blocking level resolution over a chain.
pub fn resolve(chain: &[Fragment], matcher: &dyn GlobMatcher) -> Result<LevelMap> {
    let decls = plan(chain);
    let expansions = expand(&decls, matcher)?;
    Ok(assemble(decls, expansions))
}

/// Async level resolution over a chain.
pub async fn resolve_async(chain: &[Fragment], matcher: &dyn GlobMatcher) -> Result<LevelMap> {
    let decls = plan(chain);
    let expansions = expand_async(&decls, matcher).await?;
    Ok(assemble(decls, expansions))
}

/// Look up a level by name, resolving it against `cwd` first.
pub fn lookup(map: &LevelMap, name: &str, cwd: &Path) -> Option<Value> {
    map.get(&paths::resolve(cwd, name)).cloned()
}
