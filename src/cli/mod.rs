mod close;
mod common;
mod error;
mod list;
mod open;
pub mod parser;
mod ui;

use clap::Parser;
use error::CliError;
use parser::Cli;

// Helper function to parse args
pub fn parse_args() -> Cli {
    Cli::parse()
}

// Main CLI execution function, receives parsed args
pub async fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        parser::Commands::Open(cmd) => cmd.run(&cli).await,
        parser::Commands::Close(cmd) => cmd.run(&cli).await,
        parser::Commands::List(cmd) => cmd.run(&cli).await,
    }
}
