//! Public query API over a resolved configuration cascade.

use super::fragment::{Fragment, FragmentChain, FragmentOrigin};
use super::levels::{self, LIBS_KEY, LevelMap, MODULES_KEY};
use super::merge::{merge_fragments, strip_metadata};
use super::options::ConfigOptions;
use super::scope::{library_path, merge_scope};
use super::truncate::{root_dir, truncate};
use crate::error::Result;
use crate::glob::{FsGlobMatcher, GlobMatcher};
use crate::loader::{FragmentLoader, FsLoader, LoadOptions, StaticLoader};
use crate::paths;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Effective configuration of a project.
///
/// The fragment chain is loaded once per instance and memoized; every query
/// is a pure function of that chain. Each query has a blocking form and an
/// `_async` form that return identical results.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use cascade_config::config::{CascadeConfig, ConfigOptions, Fragment, FragmentOrigin};
/// use cascade_config::glob::StaticGlobMatcher;
/// use cascade_config::loader::StaticLoader;
///
/// let chain = vec![
///     Fragment::from_value(
///         "/proj/.cascaderc",
///         FragmentOrigin::Project,
///         json!({"root": true, "levels": {"blocks": {"techs": ["css"]}}}),
///     )
///     .unwrap(),
/// ];
/// let config = CascadeConfig::with_parts(
///     ConfigOptions::new("cascade").with_cwd("/proj"),
///     Arc::new(StaticLoader::new(chain)),
///     Arc::new(StaticGlobMatcher::new()),
/// );
///
/// assert_eq!(config.level("blocks").unwrap(), Some(json!({"techs": ["css"]})));
/// assert_eq!(config.root().unwrap(), Some("/proj".into()));
/// ```
pub struct CascadeConfig {
    options: ConfigOptions,
    load_options: LoadOptions,
    loader: Arc<dyn FragmentLoader>,
    matcher: Arc<dyn GlobMatcher>,
    chain: Mutex<Option<Arc<FragmentChain>>>,
}

impl std::fmt::Debug for CascadeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeConfig")
            .field("options", &self.options)
            .field("cwd", &self.load_options.cwd)
            .finish_non_exhaustive()
    }
}

impl CascadeConfig {
    /// Configuration discovered from rc files on disk.
    ///
    /// Each instance reads the disk once and memoizes its chain. To share
    /// loads between instances, pass one [`CachingLoader`] to
    /// [`with_parts`](Self::with_parts).
    ///
    /// [`CachingLoader`]: crate::loader::CachingLoader
    pub fn new(options: ConfigOptions) -> Self {
        Self::with_parts(
            options,
            Arc::new(FsLoader::new()),
            Arc::new(FsGlobMatcher::new()),
        )
    }

    /// Configuration over injected collaborators.
    pub fn with_parts(
        options: ConfigOptions,
        loader: Arc<dyn FragmentLoader>,
        matcher: Arc<dyn GlobMatcher>,
    ) -> Self {
        let load_options = options.load_options();
        Self {
            options,
            load_options,
            loader,
            matcher,
            chain: Mutex::new(None),
        }
    }

    /// Construction options.
    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// Absolute directory levels are looked up from.
    pub fn cwd(&self) -> &Path {
        &self.load_options.cwd
    }

    /// Forget the memoized chain; the next query loads again.
    pub fn reload(&self) {
        *self.memo() = None;
    }

    fn memo(&self) -> std::sync::MutexGuard<'_, Option<Arc<FragmentChain>>> {
        self.chain.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remember(&self, loaded: FragmentChain) -> Result<Arc<FragmentChain>> {
        let chain = Arc::new(self.layer(loaded)?);
        *self.memo() = Some(Arc::clone(&chain));
        Ok(chain)
    }

    /// Place `defaults` first and `extendBy` just below trailing
    /// command-line fragments.
    fn layer(&self, loaded: FragmentChain) -> Result<FragmentChain> {
        let cwd = self.cwd();
        let mut chain = Vec::with_capacity(loaded.len() + 2);

        if let Some(ref defaults) = self.options.defaults {
            chain.push(Fragment::in_memory(
                cwd,
                FragmentOrigin::Defaults,
                strip_metadata(defaults.clone()),
            )?);
        }
        chain.extend(loaded);

        if let Some(ref extend_by) = self.options.extend_by {
            let fragment = Fragment::in_memory(
                cwd,
                FragmentOrigin::ExtendBy,
                strip_metadata(extend_by.clone()),
            )?;
            let trailing_cli = chain
                .iter()
                .rev()
                .take_while(|f| f.origin == FragmentOrigin::CommandLine)
                .count();
            chain.insert(chain.len() - trailing_cli, fragment);
        }

        Ok(chain)
    }

    fn chain(&self) -> Result<Arc<FragmentChain>> {
        let memo = self.memo().clone();
        if let Some(chain) = memo {
            return Ok(chain);
        }
        let loaded = self.loader.load(&self.load_options)?;
        self.remember(loaded)
    }

    async fn chain_async(&self) -> Result<Arc<FragmentChain>> {
        let memo = self.memo().clone();
        if let Some(chain) = memo {
            return Ok(chain);
        }
        let loaded = self.loader.load_async(&self.load_options).await?;
        self.remember(loaded)
    }

    // configs

    /// Every fragment, untruncated, with provenance.
    pub fn configs(&self) -> Result<FragmentChain> {
        Ok(self.chain()?.as_ref().clone())
    }

    pub async fn configs_async(&self) -> Result<FragmentChain> {
        Ok(self.chain_async().await?.as_ref().clone())
    }

    // root

    /// Directory of the fragment marked `root: true`, if any.
    pub fn root(&self) -> Result<Option<PathBuf>> {
        Ok(root_dir(&self.chain()?))
    }

    pub async fn root_async(&self) -> Result<Option<PathBuf>> {
        Ok(root_dir(&self.chain_async().await?))
    }

    // get

    /// The merged configuration of the truncated chain.
    pub fn get(&self) -> Result<Value> {
        Ok(merge_fragments(truncate(&self.chain()?)))
    }

    pub async fn get_async(&self) -> Result<Value> {
        Ok(merge_fragments(truncate(&self.chain_async().await?)))
    }

    // levels

    /// Every level, keyed by absolute directory.
    pub fn level_map(&self) -> Result<LevelMap> {
        let chain = self.chain()?;
        levels::resolve(truncate(&chain), self.matcher.as_ref())
    }

    pub async fn level_map_async(&self) -> Result<LevelMap> {
        let chain = self.chain_async().await?;
        levels::resolve_async(truncate(&chain), self.matcher.as_ref()).await
    }

    /// Level configuration for a directory, relative to [`cwd`](Self::cwd).
    pub fn level(&self, name: &str) -> Result<Option<Value>> {
        Ok(levels::lookup(&self.level_map()?, name, self.cwd()))
    }

    pub async fn level_async(&self, name: &str) -> Result<Option<Value>> {
        Ok(levels::lookup(
            &self.level_map_async().await?,
            name,
            self.cwd(),
        ))
    }

    // libraries

    /// A library's configuration, itself queryable like a project.
    pub fn library(&self, name: &str) -> Result<Option<CascadeConfig>> {
        let chain = self.chain()?;
        self.library_view(&chain, name)
    }

    pub async fn library_async(&self, name: &str) -> Result<Option<CascadeConfig>> {
        let chain = self.chain_async().await?;
        self.library_view(&chain, name)
    }

    fn library_view(&self, chain: &[Fragment], name: &str) -> Result<Option<CascadeConfig>> {
        let Some(value) = merge_scope(truncate(chain), LIBS_KEY, name) else {
            return Ok(None);
        };
        if !value.is_object() {
            debug!(library = name, "Library entry is not a mapping");
            return Ok(None);
        }

        let anchor = root_dir(chain).unwrap_or_else(|| self.cwd().to_path_buf());
        let base = match library_path(&value) {
            Some(path) => paths::resolve(&anchor, path),
            None => anchor,
        };
        debug!(library = name, base = %base.display(), "Building library view");

        let fragment = Fragment::in_memory(&base, FragmentOrigin::Synthetic, value)?;
        let options = ConfigOptions::new(self.options.name.clone()).with_cwd(base);
        Ok(Some(CascadeConfig::with_parts(
            options,
            Arc::new(StaticLoader::single(fragment)),
            Arc::clone(&self.matcher),
        )))
    }

    // modules

    /// A module's merged configuration block.
    pub fn module(&self, name: &str) -> Result<Option<Value>> {
        Ok(merge_scope(truncate(&self.chain()?), MODULES_KEY, name))
    }

    pub async fn module_async(&self, name: &str) -> Result<Option<Value>> {
        Ok(merge_scope(
            truncate(&self.chain_async().await?),
            MODULES_KEY,
            name,
        ))
    }
}
