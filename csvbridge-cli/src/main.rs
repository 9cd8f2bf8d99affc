//! csvbridge CLI - keep ledger imports free of duplicates

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, dedup, fetch, history, window};

/// csvbridge - reconcile parsed CSV lines against the ledger
#[derive(Parser)]
#[command(name = "csvbridge", version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove lines the ledger already has
    Dedup {
        /// JSON file holding an array of lines
        file: PathBuf,
        /// Write surviving lines here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the date window a batch of lines covers
    Window {
        /// JSON file holding an array of lines
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List ledger transactions in a date range
    Fetch {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// Last day (YYYY-MM-DD), defaults to start
        #[arg(long)]
        end: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show previous deduplication runs
    History {
        #[command(subcommand)]
        command: history::HistoryCommands,
    },

    /// View or change connection settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    csvbridge_core::services::init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dedup { file, output, json } => dedup::run(&file, output.as_deref(), json),
        Commands::Window { file, json } => window::run(&file, json),
        Commands::Fetch { start, end, json } => fetch::run(&start, end.as_deref(), json),
        Commands::History { command } => history::run(command),
        Commands::Config { command } => config::run(command),
    }
}
