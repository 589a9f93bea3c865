//! Booker - end-to-end API suite runner for the Restful Booker service
//!
//! Runs YAML-defined suites of dependent HTTP calls and assertions against
//! the booking service, plus a few direct inspection commands.

use booker::{cli, commands, common};
use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "booker", about = "E2E API suite runner for the booking service")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    common::logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::dispatch(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
