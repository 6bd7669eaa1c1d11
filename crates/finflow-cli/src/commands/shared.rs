//! Shared command utilities
//!
//! This module contains:
//! - `load_config` - Resolve the engine config
//! - `load_statement` - Read a statement CSV into a raw table
//! - `load_limits` - Read a budget limits file
//! - `build_analyzer` - Engine plus optional classifier
//! - `run_categorize` - Normalize and categorize a statement file

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use finflow_core::{
    read_csv, read_limits, AIBackend, AIClient, Analyzer, BatchWarning, BudgetLimits,
    CategorizeOutcome, EngineConfig, RawTable, RejectedRow, SignConvention,
};
use tracing::{info, warn};

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            EngineConfig::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => EngineConfig::load().context("Failed to load engine config"),
    }
}

pub fn load_statement(file: &Path) -> Result<RawTable> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    read_csv(csv_file).with_context(|| format!("Failed to parse CSV: {}", file.display()))
}

pub fn load_limits(path: Option<&Path>) -> Result<BudgetLimits> {
    let Some(path) = path else {
        return Ok(BudgetLimits::new());
    };
    let limits_file =
        File::open(path).with_context(|| format!("Failed to open limits: {}", path.display()))?;
    read_limits(limits_file).with_context(|| format!("Invalid limits file: {}", path.display()))
}

pub fn sign_convention(credit: bool) -> SignConvention {
    if credit {
        SignConvention::ExpensePositive
    } else {
        SignConvention::Standard
    }
}

/// Build the analyzer, attaching the classifier only when it answers
pub async fn build_analyzer(config: &EngineConfig, classifier: Option<AIClient>) -> Analyzer {
    let analyzer = Analyzer::new(config.clone());
    let Some(client) = classifier else {
        return analyzer;
    };

    if client.health_check().await {
        info!(model = client.model(), host = client.host(), "Using classifier");
        analyzer.with_classifier(client)
    } else {
        warn!(
            host = client.host(),
            "Classifier not reachable, unmatched transactions will be Other"
        );
        analyzer
    }
}

pub async fn run_categorize(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
) -> Result<(CategorizeOutcome, Vec<RejectedRow>)> {
    let table = load_statement(file)?;
    let analyzer = build_analyzer(config, classifier).await;
    analyzer
        .categorize(&table, sign_convention(credit))
        .await
        .with_context(|| format!("Unusable statement: {}", file.display()))
}

/// Print dropped rows and degraded batches
pub fn print_problems(rejected: &[RejectedRow], warnings: &[BatchWarning]) {
    if !rejected.is_empty() {
        println!();
        println!("⚠️  Skipped {} rows:", rejected.len());
        for row in rejected {
            println!("   row {}: {}", row.index + 1, row.reason);
        }
    }

    if !warnings.is_empty() {
        println!();
        println!("⚠️  Classifier failed for {} batches:", warnings.len());
        for warning in warnings {
            println!(
                "   batch {} ({} transactions set to Other): {}",
                warning.batch + 1,
                warning.size,
                warning.reason
            );
        }
    }
}
