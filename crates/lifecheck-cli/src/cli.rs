use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "lifecheck",
    about = "Lifecycle verification for declarative SQL resources",
    version
)]
pub struct Cli {
    /// Location baked into generated fixtures.
    #[arg(long, env = "LIFECHECK_LOCATION", default_value = "West US", global = true)]
    pub location: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the scenario catalog.
    List,

    /// Run a scenario end-to-end against the simulated provider.
    Run {
        /// Scenario name (see `list`).
        scenario: String,

        /// Fixed run id; a random one is generated when absent.
        #[arg(long)]
        run_id: Option<u32>,
    },

    /// Print a scenario's fixture documents as YAML.
    Render {
        /// Scenario name (see `list`).
        scenario: String,

        /// Fixed run id; a random one is generated when absent.
        #[arg(long)]
        run_id: Option<u32>,
    },
}
