//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// FinFlow - Turn bank statements into spending insight
#[derive(Parser)]
#[command(name = "finflow")]
#[command(about = "Transaction categorization, anomaly and recurring charge detection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine config file (defaults to the data dir override, then built-in values)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Statement input shared by every command
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Statement CSV file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Credit card statement (charges are positive and get negated)
    #[arg(long)]
    pub credit: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis: categories, flags, recurring charges, budgets
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Budget limits JSON file, e.g. {"Groceries": 300}
        #[arg(short, long)]
        limits: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Categorize transactions
    Categorize {
        #[command(flatten)]
        input: InputArgs,

        /// Print transactions as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recurring charges and their monthly cost
    Recurring {
        #[command(flatten)]
        input: InputArgs,

        /// Print groups as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask the AI backend a question about a statement
    Ask {
        #[command(flatten)]
        input: InputArgs,

        /// Question, e.g. "How much did I spend on food?"
        question: String,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare category spending with budget limits
    Budgets {
        #[command(flatten)]
        input: InputArgs,

        /// Budget limits JSON file, e.g. {"Groceries": 300}
        #[arg(short, long)]
        limits: Option<PathBuf>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
}
