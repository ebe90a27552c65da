//! rc file discovery on disk.
//!
//! Loads fragments from every scope, most general first:
//! 1. **System** - `<fs_root>/etc/<name>rc`, `<fs_root>/etc/<name>/config`
//! 2. **Home** - `~/.<name>rc`, `~/.config/<name>`, `~/.config/<name>/config`
//! 3. **Project** - `.<name>rc[.json|.yaml|.yml]` in every directory from
//!    `fs_root` down to `cwd` (first existing name per directory)
//! 4. **Explicit** - `path_to_config`, when given
//! 5. **Command line** - `argv`, when given

use super::{FragmentLoader, LoadOptions};
use crate::config::{Fragment, FragmentChain, FragmentOrigin};
use crate::error::{ConfigError, Result};
use crate::paths;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One place a fragment may come from: the first existing candidate wins.
#[derive(Debug, Clone)]
struct Slot {
    origin: FragmentOrigin,
    candidates: Vec<PathBuf>,
    required: bool,
}

/// Loads fragments from rc files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    pub fn new() -> Self {
        Self
    }

    /// Every rc file location for `options`, in chain order.
    fn slots(options: &LoadOptions) -> Vec<Slot> {
        let name = &options.name;
        let etc = options.fs_root.join("etc");

        let mut discovered = vec![
            (FragmentOrigin::System, vec![etc.join(format!("{name}rc"))]),
            (FragmentOrigin::System, vec![etc.join(name).join("config")]),
        ];
        if let Some(ref home) = options.fs_home {
            let home_rc = home.join(format!(".{name}rc"));
            let config_dir = home.join(".config").join(name);
            discovered.push((FragmentOrigin::Home, vec![home_rc]));
            discovered.push((FragmentOrigin::Home, vec![config_dir.clone()]));
            discovered.push((FragmentOrigin::Home, vec![config_dir.join("config")]));
        }
        for dir in ancestors(&paths::normalize(&options.cwd), &options.fs_root) {
            let candidates = ["", ".json", ".yaml", ".yml"]
                .iter()
                .map(|ext| dir.join(format!(".{name}rc{ext}")))
                .collect();
            discovered.push((FragmentOrigin::Project, candidates));
        }

        // A path reached by two slots is read once, in the earlier one
        let mut seen = HashSet::new();
        let mut slots: Vec<Slot> = discovered
            .into_iter()
            .filter_map(|(origin, candidates)| {
                let candidates: Vec<PathBuf> = candidates
                    .into_iter()
                    .filter(|path| seen.insert(path.clone()))
                    .collect();
                (!candidates.is_empty()).then_some(Slot {
                    origin,
                    candidates,
                    required: false,
                })
            })
            .collect();

        if let Some(ref explicit) = options.path_to_config {
            // An explicit file is loaded even when discovery already saw it
            slots.push(Slot {
                origin: FragmentOrigin::Explicit,
                candidates: vec![paths::resolve(&options.cwd, explicit)],
                required: true,
            });
        }

        slots
    }

    fn missing_required(slot: &Slot) -> ConfigError {
        let path = slot.candidates.first().cloned().unwrap_or_default();
        ConfigError::load(path, "file does not exist")
    }

    fn argv_fragment(options: &LoadOptions) -> Result<Option<Fragment>> {
        options
            .argv
            .clone()
            .map(|argv| Fragment::in_memory(&options.cwd, FragmentOrigin::CommandLine, argv))
            .transpose()
    }
}

#[async_trait]
impl FragmentLoader for FsLoader {
    fn load(&self, options: &LoadOptions) -> Result<FragmentChain> {
        let mut chain = Vec::new();

        for slot in Self::slots(options) {
            let mut found = false;
            for path in &slot.candidates {
                if !std::fs::metadata(path).is_ok_and(|m| m.is_file()) {
                    continue;
                }
                found = true;
                match std::fs::read_to_string(path) {
                    Ok(content) => {
                        if let Some(fragment) = parse_fragment(path, slot.origin, &content)? {
                            chain.push(fragment);
                        }
                    }
                    Err(e) => skip_unreadable(path, &slot, e)?,
                }
                break;
            }
            if !found && slot.required {
                return Err(Self::missing_required(&slot));
            }
        }

        chain.extend(Self::argv_fragment(options)?);
        debug!(cwd = %options.cwd.display(), fragments = chain.len(), "Loaded configuration chain");
        Ok(chain)
    }

    async fn load_async(&self, options: &LoadOptions) -> Result<FragmentChain> {
        let mut chain = Vec::new();

        for slot in Self::slots(options) {
            let mut found = false;
            for path in &slot.candidates {
                if !tokio::fs::metadata(path).await.is_ok_and(|m| m.is_file()) {
                    continue;
                }
                found = true;
                match tokio::fs::read_to_string(path).await {
                    Ok(content) => {
                        if let Some(fragment) = parse_fragment(path, slot.origin, &content)? {
                            chain.push(fragment);
                        }
                    }
                    Err(e) => skip_unreadable(path, &slot, e)?,
                }
                break;
            }
            if !found && slot.required {
                return Err(Self::missing_required(&slot));
            }
        }

        chain.extend(Self::argv_fragment(options)?);
        debug!(cwd = %options.cwd.display(), fragments = chain.len(), "Loaded configuration chain");
        Ok(chain)
    }
}

/// Directories from `fs_root` (or the filesystem root when `cwd` is not
/// under it) down to `cwd`.
fn ancestors(cwd: &Path, fs_root: &Path) -> Vec<PathBuf> {
    let fs_root = paths::normalize(fs_root);
    let mut dirs = Vec::new();
    for dir in cwd.ancestors() {
        dirs.push(dir.to_path_buf());
        if dir == fs_root {
            break;
        }
    }
    dirs.reverse();
    dirs
}

fn skip_unreadable(path: &Path, slot: &Slot, err: std::io::Error) -> Result<()> {
    if slot.required {
        return Err(ConfigError::load(path, err));
    }
    if err.kind() != ErrorKind::NotFound {
        warn!(path = %path.display(), error = %err, "Skipping unreadable rc file");
    }
    Ok(())
}

/// Parse rc file content into a fragment.
///
/// `.yaml`/`.yml` files are YAML, `.json` files are JSON, anything else is
/// tried as JSON first and then as YAML. Blank files and empty YAML
/// documents yield `None`.
pub fn parse_fragment(
    path: &Path,
    origin: FragmentOrigin,
    content: &str,
) -> Result<Option<Fragment>> {
    if content.trim().is_empty() {
        return Ok(None);
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value: Value = match extension {
        "yaml" | "yml" => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        _ => serde_json::from_str(content)
            .or_else(|_| serde_yaml::from_str(content))
            .map_err(|e| e.to_string()),
    }
    .map_err(|message| ConfigError::load(path, message))?;

    if value.is_null() {
        return Ok(None);
    }

    debug!(path = %path.display(), %origin, "Parsed rc file");
    Fragment::from_value(path, origin, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ancestors_stop_at_fs_root() {
        assert_eq!(
            ancestors(Path::new("/a/b/c"), Path::new("/a")),
            vec![
                PathBuf::from("/a"),
                PathBuf::from("/a/b"),
                PathBuf::from("/a/b/c")
            ]
        );
    }

    #[test]
    fn test_ancestors_outside_fs_root_walk_to_top() {
        assert_eq!(
            ancestors(Path::new("/x/y"), Path::new("/a")),
            vec![
                PathBuf::from("/"),
                PathBuf::from("/x"),
                PathBuf::from("/x/y")
            ]
        );
    }

    #[test]
    fn test_parse_json_and_yaml() {
        let json_fragment = parse_fragment(
            Path::new("/p/.cascaderc"),
            FragmentOrigin::Project,
            r#"{"root": true, "levels": {"blocks": {}}}"#,
        )
        .unwrap()
        .unwrap();
        assert!(json_fragment.is_root());

        let yaml_fragment = parse_fragment(
            Path::new("/p/.cascaderc"),
            FragmentOrigin::Project,
            "root: true\nlevels:\n  blocks:\n    techs: [css]\n",
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            yaml_fragment.get("levels"),
            Some(&json!({"blocks": {"techs": ["css"]}}))
        );
    }

    #[test]
    fn test_parse_blank_and_empty_documents() {
        let path = Path::new("/p/.cascaderc.yaml");
        let blank = parse_fragment(path, FragmentOrigin::Project, "  \n");
        assert!(blank.unwrap().is_none());

        let comment = parse_fragment(path, FragmentOrigin::Project, "# only a comment\n");
        assert!(comment.unwrap().is_none());
    }

    #[test]
    fn test_parse_json_extension_is_strict() {
        let err = parse_fragment(
            Path::new("/p/.cascaderc.json"),
            FragmentOrigin::Project,
            "levels: {}",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn test_parse_non_mapping() {
        let err = parse_fragment(
            Path::new("/p/.cascaderc"),
            FragmentOrigin::Project,
            "[1, 2]",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFragment { .. }));
    }

    #[test]
    fn test_slots_dedupe_home_inside_project() {
        let options = LoadOptions::new("cascade")
            .with_fs_root("/")
            .with_fs_home("/home/u")
            .with_cwd("/home/u/proj");

        let slots = FsLoader::slots(&options);
        let home_rc = PathBuf::from("/home/u/.cascaderc");
        let owners: Vec<_> = slots
            .iter()
            .filter(|slot| slot.candidates.contains(&home_rc))
            .map(|slot| slot.origin)
            .collect();
        assert_eq!(owners, vec![FragmentOrigin::Home]);
    }
}
