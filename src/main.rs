//! cascade-config
//!
//! Prints the effective configuration of a project, or one of its levels,
//! libraries or modules.

use anyhow::Result;
use cascade_config::cli::{Cli, Command, LibraryQuery, error_message};
use cascade_config::config::CascadeConfig;
use cascade_config::format::OutputFormat;
use cascade_config::logging::{self, LogTarget};
use clap::Parser;
use serde_json::Value;
use tracing::debug;

/// Run a query and render its result.
async fn run(config: &CascadeConfig, command: Command, format: OutputFormat) -> Result<String> {
    let rendered = match command {
        Command::Get => format.render(&config.get_async().await?)?,
        Command::Configs => format.render(&config.configs_async().await?)?,
        Command::Root => format.render(&config.root_async().await?)?,
        Command::Level { path } => format.render(&config.level_async(&path).await?)?,
        Command::LevelMap => format.render(&config.level_map_async().await?)?,
        Command::Module { name } => format.render(&config.module_async(&name).await?)?,
        Command::Library { name, query } => {
            let Some(library) = config.library_async(&name).await? else {
                return format.render(&Value::Null);
            };
            match query.unwrap_or(LibraryQuery::Get) {
                LibraryQuery::Get => format.render(&library.get_async().await?)?,
                LibraryQuery::Level { path } => {
                    format.render(&library.level_async(&path).await?)?
                }
                LibraryQuery::LevelMap => format.render(&library.level_map_async().await?)?,
            }
        }
    };
    Ok(rendered)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let options = cli.config_options()?;
    let config = CascadeConfig::new(options);
    debug!(cwd = %config.cwd().display(), "Resolving configuration");

    match run(&config, cli.command(), cli.format).await {
        Ok(output) => println!("{}", output),
        Err(err) => {
            eprintln!("{}", error_message(&err));
            std::process::exit(1);
        }
    }

    Ok(())
}
