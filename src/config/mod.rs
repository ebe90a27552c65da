//! Configuration resolution engine.
//!
//! Turns an ordered chain of configuration fragments into the effective
//! configuration of a project:
//! 1. **Truncation** - fragments before the one marked `root: true` are dropped
//! 2. **Merge** - the remaining fragments are deep-merged, later wins
//! 3. **Levels** - `levels` maps are resolved into absolute directories,
//!    wildcard keys expanded through a glob matcher
//! 4. **Scopes** - `libs.<name>` and `modules.<name>` are merged on demand
//!
//! ## Merge Strategy
//! - Mappings: deep merge field-by-field
//! - Everything else (arrays included): replaced by the later value
//! - `configs()` is the only query that sees the untruncated chain

mod facade;
mod fragment;
pub mod levels;
mod merge;
mod options;
pub mod scope;
pub mod truncate;

pub use facade::CascadeConfig;
pub use fragment::{Fragment, FragmentChain, FragmentOrigin, ROOT_KEY, SOURCE_KEY, value_kind};
pub use levels::LevelMap;
pub use merge::{deep_merge, deep_merge_all, merge_fragments, strip_metadata};
pub use options::ConfigOptions;
