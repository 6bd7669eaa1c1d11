//! FinFlow CLI - Transaction intelligence for bank statements
//!
//! Usage:
//!   finflow analyze --file CSV [--credit] [--limits JSON]   Full analysis
//!   finflow categorize --file CSV                           Category per transaction
//!   finflow recurring --file CSV                            Recurring charges
//!   finflow budgets --file CSV --limits JSON                Budget status
//!   finflow ask --file CSV "QUESTION"                       Ask the AI backend

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use finflow_core::AIClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref())?;
    let classifier = AIClient::from_env();

    match cli.command {
        Commands::Analyze {
            input,
            limits,
            json,
        } => {
            commands::cmd_analyze(
                &config,
                classifier,
                &input.file,
                input.credit,
                limits.as_deref(),
                json,
            )
            .await
        }
        Commands::Categorize { input, json } => {
            commands::cmd_categorize(&config, classifier, &input.file, input.credit, json).await
        }
        Commands::Recurring { input, json } => {
            commands::cmd_recurring(&config, classifier, &input.file, input.credit, json).await
        }
        Commands::Ask {
            input,
            question,
            json,
        } => {
            commands::cmd_ask(
                &config,
                classifier,
                &input.file,
                input.credit,
                &question,
                json,
            )
            .await
        }
        Commands::Budgets {
            input,
            limits,
            json,
        } => {
            commands::cmd_budgets(
                &config,
                classifier,
                &input.file,
                input.credit,
                limits.as_deref(),
                json,
            )
            .await
        }
    }
}
