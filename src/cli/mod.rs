//! CLI command definitions for cascade-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use crate::config::ConfigOptions;
use crate::error::ConfigError;
use crate::format::OutputFormat;
use crate::loader::DEFAULT_NAME;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;

/// Inspect the effective configuration of a project
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to resolve the configuration for (default: current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Tool name; rc files are looked up as `.<name>rc`
    #[arg(short, long, default_value = DEFAULT_NAME, global = true)]
    pub name: String,

    /// Explicit config file loaded on top of discovered rc files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Topmost directory searched for rc files
    #[arg(long, global = true)]
    pub fs_root: Option<PathBuf>,

    /// Home directory searched for user rc files
    #[arg(long, global = true)]
    pub fs_home: Option<PathBuf>,

    /// JSON object merged as the most general fragment
    #[arg(long, global = true)]
    pub defaults: Option<String>,

    /// JSON object layered just below command-line overrides
    #[arg(long, global = true)]
    pub extend_by: Option<String>,

    /// JSON object of command-line overrides (most specific fragment)
    #[arg(long = "set", global = true)]
    pub overrides: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json", global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print the merged configuration (default if no subcommand given)
    Get,

    /// Print every fragment of the chain with its source
    Configs,

    /// Print the project root directory
    Root,

    /// Print the configuration of one level
    Level {
        /// Level directory, relative to the working directory
        path: String,
    },

    /// Print every level keyed by directory
    LevelMap,

    /// Query a library scope
    Library {
        /// Library name
        name: String,

        #[command(subcommand)]
        query: Option<LibraryQuery>,
    },

    /// Print the configuration of one module
    Module {
        /// Module name
        name: String,
    },
}

/// Queries available on a library scope
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LibraryQuery {
    /// Print the merged library configuration (default)
    Get,

    /// Print one level of the library
    Level {
        /// Level directory, relative to the library directory
        path: String,
    },

    /// Print every level of the library
    LevelMap,
}

fn parse_json_arg(flag: &str, raw: Option<&str>) -> Result<Option<Value>> {
    raw.map(|raw| {
        serde_json::from_str(raw).with_context(|| format!("--{flag} must be a JSON object"))
    })
    .transpose()
}

impl Cli {
    /// Construction options described by the global flags.
    pub fn config_options(&self) -> Result<ConfigOptions> {
        let mut options = ConfigOptions::new(self.name.clone());
        options.cwd = self.cwd.clone();
        options.fs_root = self.fs_root.clone();
        options.fs_home = self.fs_home.clone();
        options.path_to_config = self.config.clone();
        options.defaults = parse_json_arg("defaults", self.defaults.as_deref())?;
        options.extend_by = parse_json_arg("extend-by", self.extend_by.as_deref())?;
        options.argv = parse_json_arg("set", self.overrides.as_deref())?;
        Ok(options)
    }

    /// The subcommand to run.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Get)
    }
}

/// One-line error report; resolution failures are prefixed with their code.
pub fn error_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ConfigError>() {
        Some(config_err) => format!("error[{}]: {config_err}", config_err.code()),
        None => format!("error: {err:#}"),
    }
}
