mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::List => commands::list(),
        Command::Run { scenario, run_id } => {
            commands::run(&scenario, &cli.location, run_id).await
        }
        Command::Render { scenario, run_id } => {
            commands::render(&scenario, &cli.location, run_id)
        }
    }
}
