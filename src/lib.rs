//! Cascade Config Library
//!
//! Resolves the effective configuration of a project from rc files found at
//! system, home, project and ancestor-directory scopes plus command-line
//! overrides. This module exports the engine for embedding and testing.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod glob;
pub mod loader;
pub mod logging;
pub mod paths;

pub use config::{CascadeConfig, ConfigOptions};
pub use error::{ConfigError, Result};
