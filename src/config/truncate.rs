//! Project-root truncation of a fragment chain.
//!
//! Every fragment before the first one marked `root: true` is excluded from
//! merge-dependent queries. Without a root marker the whole chain is used.

use super::fragment::Fragment;
use std::path::PathBuf;
use tracing::debug;

/// Index of the first fragment whose `root` marker is exactly `true`.
pub fn root_index(chain: &[Fragment]) -> Option<usize> {
    chain.iter().position(Fragment::is_root)
}

/// Suffix of `chain` starting at the root fragment, or the whole chain when
/// no fragment is marked root.
pub fn truncate(chain: &[Fragment]) -> &[Fragment] {
    match root_index(chain) {
        Some(index) => {
            if index > 0 {
                debug!(
                    dropped = index,
                    root = %chain[index].source.display(),
                    "Truncating configuration chain at project root"
                );
            }
            &chain[index..]
        }
        None => {
            debug!(
                fragments = chain.len(),
                "No root fragment in chain, using whole chain"
            );
            chain
        }
    }
}

/// Directory containing the root fragment's source file.
pub fn root_dir(chain: &[Fragment]) -> Option<PathBuf> {
    root_index(chain).map(|index| chain[index].dir())
}
