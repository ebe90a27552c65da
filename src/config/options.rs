//! Construction options for [`CascadeConfig`](super::CascadeConfig).

use crate::loader::{DEFAULT_NAME, LoadOptions};
use crate::paths;
use serde_json::Value;
use std::path::PathBuf;

/// How a configuration instance finds and layers its fragments.
///
/// Every field is optional; unset scope boundaries fall back to the
/// environment and then to the current directory and the user's home.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOptions {
    /// Tool name; rc files are called `.<name>rc`.
    pub name: String,
    /// Directory the cascade ends at and levels are looked up from.
    pub cwd: Option<PathBuf>,
    /// Topmost directory searched for rc files.
    pub fs_root: Option<PathBuf>,
    /// Home directory searched for user rc files.
    pub fs_home: Option<PathBuf>,
    /// Explicit config file loaded on top of the discovered rc files.
    pub path_to_config: Option<PathBuf>,
    /// Fragment merged as the most general entry.
    pub defaults: Option<Value>,
    /// Fragment layered just below command-line overrides.
    pub extend_by: Option<Value>,
    /// Command-line overrides.
    pub argv: Option<Value>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl ConfigOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cwd: None,
            fs_root: None,
            fs_home: None,
            path_to_config: None,
            defaults: None,
            extend_by: None,
            argv: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_fs_root(mut self, fs_root: impl Into<PathBuf>) -> Self {
        self.fs_root = Some(fs_root.into());
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

    pub fn with_defaults(mut self, defaults: Value) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn with_extend_by(mut self, extend_by: Value) -> Self {
        self.extend_by = Some(extend_by);
        self
    }

    pub fn with_argv(mut self, argv: Value) -> Self {
        self.argv = Some(argv);
        self
    }

    /// Options handed to the fragment loader.
    ///
    /// Explicit fields win over the environment. Explicit paths are made
    /// absolute against the process working directory, not `cwd`.
    pub fn load_options(&self) -> LoadOptions {
        let mut options = LoadOptions::discover(self.name.clone());

        let current = paths::current_dir();
        options.cwd = match self.cwd {
            Some(ref cwd) => paths::resolve(&current, cwd),
            None => paths::normalize(&current),
        };
        if let Some(ref fs_root) = self.fs_root {
            options.fs_root = paths::resolve(&current, fs_root);
        }
        if let Some(ref fs_home) = self.fs_home {
            options.fs_home = Some(paths::resolve(&current, fs_home));
        }
        if let Some(ref path) = self.path_to_config {
            options.path_to_config = Some(paths::resolve(&current, path));
        }
        options.argv = self.argv.clone();

        options
    }
}
