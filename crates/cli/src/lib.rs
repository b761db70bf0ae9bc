pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "reccy",
    about = "Content-based product recommendation engine",
    long_about = "Fetches the product catalog, computes per-product recommendation lists from \
                  attribute similarity, and reconciles them into the store's recommendation table.",
    after_help = "Examples:\n  reccy run\n  reccy run --config config/reccy.toml --dry-run\n  reccy config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Fetch the catalog, compute recommendations, and sync them to the store")]
    Run {
        #[arg(long, help = "Path to the config file (required to exist when given)")]
        config: Option<PathBuf>,
        #[arg(long, help = "Compute the reconciliation plan but apply nothing")]
        dry_run: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config {
        #[arg(long, help = "Path to the config file (required to exist when given)")]
        config: Option<PathBuf>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { config, dry_run } => commands::run::run(config, dry_run),
        Command::Config { config } => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(config) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
