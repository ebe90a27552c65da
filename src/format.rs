//! Output formatting for query results.

use anyhow::Result;
use serde::Serialize;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render a value; absent results render as `null`.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        Ok(rendered.trim_end().to_string())
    }
}
