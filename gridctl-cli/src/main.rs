//! Gridctl CLI
//!
//! Command-line interface for managing grid jobs recorded in the local job list.

mod backends;
mod commands;
mod config;
mod output;
mod types;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::GlobalArgs;
use std::process::ExitCode;
use tracing::{Instrument, info_span};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "gridctl")]
#[command(about = "Grid job management CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.global.log_filter())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match cli.global.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let span = info_span!("gridctl", joblist = %config.job_list.display());

    match handle_command(cli.command, config).instrument(span).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
