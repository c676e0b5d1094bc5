//! filerelay CLI - command-line interface
//!
//! Runs the relay against a console transport and exposes maintenance
//! commands over the same storage root.

mod commands;
mod console;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::commands::run::RunArgs;
use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "filerelay")]
#[command(version, about = "Fetch links into per-user storage and deliver them back, split when large")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Configuration file (INI)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Storage root, overriding the config file and BASE_DIR
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Also write daily log files to this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start an interactive session reading messages from stdin
    Run {
        /// User id the messages come from
        #[arg(long)]
        user: u64,

        /// Chat id replies go to
        #[arg(long, default_value_t = 1)]
        chat: u64,
    },

    /// Delete expired files now
    Sweep {
        /// Use this age instead of the configured retention window
        #[arg(long, value_name = "SECS")]
        older_than_secs: Option<u64>,
    },

    /// List a user's stored files
    Ls {
        /// User id whose files to list
        #[arg(long)]
        user: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = execute(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn execute(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(&cli.global)?;
    match cli.command {
        Commands::Run { user, chat } => commands::run::run(&runner, RunArgs { user, chat }),
        Commands::Sweep { older_than_secs } => commands::sweep::run(&runner, older_than_secs),
        Commands::Ls { user } => commands::ls::run(&runner, user),
    }
}
