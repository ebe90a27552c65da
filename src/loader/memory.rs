//! In-memory fragment chains.

use super::{FragmentLoader, LoadOptions};
use crate::config::{Fragment, FragmentChain};
use crate::error::Result;
use async_trait::async_trait;

/// Serves a fixed chain regardless of the options it is asked with.
///
/// Backs library views and lets embedders feed chains they assembled
/// themselves.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    chain: FragmentChain,
}

impl StaticLoader {
    pub fn new(chain: FragmentChain) -> Self {
        Self { chain }
    }

    /// Loader over a single fragment.
    pub fn single(fragment: Fragment) -> Self {
        Self::new(vec![fragment])
    }
}

#[async_trait]
impl FragmentLoader for StaticLoader {
    fn load(&self, _options: &LoadOptions) -> Result<FragmentChain> {
        Ok(self.chain.clone())
    }
}
