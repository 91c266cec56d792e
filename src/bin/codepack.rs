//! Codepack CLI Binary

use anyhow::Context;
use clap::Parser;
use codepack::config::ConfigLoader;
use codepack::logging::init_logging;
use codepack::tooling::cli::{Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::resolve(&cli.workspace, cli.config.as_deref())
        .context("Error loading configuration")?;
    let logging = cli.logging_config(&config.logging)?;
    init_logging(Some(&logging)).context("Error initializing logging")?;

    let context = CliContext::new(cli.workspace.clone(), config)
        .context("Error initializing workspace")?;

    let output = context.execute(&cli.command).await?;
    if output.ends_with('\n') {
        print!("{}", output);
    } else if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
