//! Grove CLI Binary
//!
//! Command-line interface for the course content tree client.

use anyhow::Context;
use clap::Parser;
use grove::config::ConfigLoader;
use grove::logging::init_logging;
use grove::tooling::cli::{Cli, CliContext};
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = ConfigLoader::load(cli.config.as_deref())
        .context("failed to load configuration")?;

    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }

    init_logging(Some(&config.logging)).context("failed to initialize logging")?;

    let context = CliContext::new(&config).context("failed to initialize client")?;
    Ok(context.execute(&cli.command).await?)
}
