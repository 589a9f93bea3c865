//! CLI command definitions
//!
//! Defines the clap commands for the booker CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Execute test suites defined in YAML files
    Test {
        /// Suite files or directories of suites
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print each request and response body
        #[arg(long, short)]
        verbose: bool,

        /// Override the service base URL from the config file
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Check that the service is up
    Ping {
        /// Override the service base URL from the config file
        #[arg(long)]
        base_url: Option<String>,
    },

    /// List booking ids
    #[command(alias = "ls")]
    List {
        /// Override the service base URL from the config file
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Show a single booking
    Get {
        /// Booking id
        id: u64,

        /// Override the service base URL from the config file
        #[arg(long)]
        base_url: Option<String>,
    },
}
