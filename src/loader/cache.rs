//! Explicit per-process cache in front of another loader.

use super::{FragmentLoader, LoadOptions};
use crate::config::FragmentChain;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Memoizes chains by their load options.
///
/// Blocking and async loads share one cache. Failed loads are not cached.
/// The lock is never held while the inner loader runs.
#[derive(Debug, Default)]
pub struct CachingLoader<L> {
    inner: L,
    cache: Mutex<HashMap<String, FragmentChain>>,
}

impl<L: FragmentLoader> CachingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drop every cached chain.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of cached chains.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, FragmentChain>> {
        // A poisoned map only ever holds complete chains
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cached(&self, key: &str) -> Option<FragmentChain> {
        let hit = self.lock().get(key).cloned();
        if hit.is_some() {
            debug!(key, "Configuration chain served from cache");
        }
        hit
    }

    fn store(&self, key: String, chain: &FragmentChain) {
        self.lock().insert(key, chain.clone());
    }
}

#[async_trait]
impl<L: FragmentLoader> FragmentLoader for CachingLoader<L> {
    fn load(&self, options: &LoadOptions) -> Result<FragmentChain> {
        let key = options.cache_key();
        if let Some(chain) = self.cached(&key) {
            return Ok(chain);
        }
        let chain = self.inner.load(options)?;
        self.store(key, &chain);
        Ok(chain)
    }

    async fn load_async(&self, options: &LoadOptions) -> Result<FragmentChain> {
        let key = options.cache_key();
        if let Some(chain) = self.cached(&key) {
            return Ok(chain);
        }
        let chain = self.inner.load_async(options).await?;
        self.store(key, &chain);
        Ok(chain)
    }
}
