//! Fragment loaders: where configuration chains come from.
//!
//! The resolution engine never touches the filesystem itself. It asks a
//! [`FragmentLoader`] for the ordered chain of fragments (most general
//! first) and works purely on that data.
//!
//! ## Environment Variables
//! For a tool named `cascade`:
//! - `CASCADE_CONFIG_PATH` - Explicit config file (loaded as the most specific rc)
//! - `CASCADE_FS_ROOT` - Topmost directory searched for rc files (default: `/`)
//! - `CASCADE_FS_HOME` - Home directory (default: the user's home)

mod cache;
mod fs;
mod memory;

pub use cache::CachingLoader;
pub use fs::FsLoader;
pub use memory::StaticLoader;

use crate::config::FragmentChain;
use crate::error::Result;
use crate::paths;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Default tool name, used to derive rc file names (`.cascaderc`).
pub const DEFAULT_NAME: &str = "cascade";

/// Scope boundaries and overrides handed to a loader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadOptions {
    /// Tool name; rc files are called `.<name>rc`.
    pub name: String,
    /// Most specific directory of the cascade.
    pub cwd: PathBuf,
    /// Topmost directory searched for ancestor rc files.
    pub fs_root: PathBuf,
    /// Home directory searched for user rc files.
    pub fs_home: Option<PathBuf>,
    /// Explicit config file, loaded after every discovered rc file.
    pub path_to_config: Option<PathBuf>,
    /// Command-line overrides, the most specific fragment of all.
    pub argv: Option<Value>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl LoadOptions {
    /// Options rooted at the current directory, without reading the
    /// environment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cwd: paths::current_dir(),
            fs_root: PathBuf::from("/"),
            fs_home: dirs::home_dir(),
            path_to_config: None,
            argv: None,
        }
    }

    /// Options for `name`, with scope overrides read from the environment.
    pub fn discover(name: impl Into<String>) -> Self {
        let mut options = Self::new(name);
        let prefix = options.env_prefix();

        if let Ok(path) = std::env::var(format!("{prefix}_CONFIG_PATH")) {
            options.path_to_config = Some(PathBuf::from(path));
        }
        if let Ok(root) = std::env::var(format!("{prefix}_FS_ROOT")) {
            options.fs_root = PathBuf::from(root);
        }
        if let Ok(home) = std::env::var(format!("{prefix}_FS_HOME")) {
            options.fs_home = Some(PathBuf::from(home));
        }

        options
    }

    /// Environment variable prefix derived from the tool name.
    pub fn env_prefix(&self) -> String {
        self.name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn with_fs_root(mut self, fs_root: impl Into<PathBuf>) -> Self {
        self.fs_root = fs_root.into();
        self
    }

    pub fn with_fs_home(mut self, fs_home: impl Into<PathBuf>) -> Self {
        self.fs_home = Some(fs_home.into());
        self
    }

    pub fn with_path_to_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.path_to_config = Some(path.into());
        self
    }

    pub fn with_argv(mut self, argv: Value) -> Self {
        self.argv = Some(argv);
        self
    }

    /// Key identifying these options in a cache.
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Produces the ordered fragment chain for a set of options.
///
/// Chains are ordered general to specific, every fragment carrying the
/// absolute path it came from. Both forms must return the same chain for
/// the same filesystem state.
#[async_trait]
pub trait FragmentLoader: Send + Sync {
    /// Load the chain, blocking.
    fn load(&self, options: &LoadOptions) -> Result<FragmentChain>;

    /// Load the chain without blocking the runtime.
    async fn load_async(&self, options: &LoadOptions) -> Result<FragmentChain> {
        self.load(options)
    }
}
