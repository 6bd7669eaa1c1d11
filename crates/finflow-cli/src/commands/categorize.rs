//! Categorize command implementation

use std::path::Path;

use anyhow::Result;
use finflow_core::{AIClient, EngineConfig};
use serde_json::json;

use super::{print_problems, run_categorize, truncate};

pub async fn cmd_categorize(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
    json_output: bool,
) -> Result<()> {
    let (outcome, rejected) = run_categorize(config, classifier, file, credit).await?;

    if json_output {
        let rows: Vec<_> = outcome
            .transactions
            .iter()
            .zip(&outcome.sources)
            .map(|(tx, source)| {
                json!({
                    "date": tx.date,
                    "description": tx.description,
                    "amount": tx.amount,
                    "category": tx.category,
                    "source": source,
                })
            })
            .collect();
        let output = json!({
            "transactions": rows,
            "rejected_rows": rejected,
            "warnings": outcome.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("🏷️  Categorized {} transactions", outcome.transactions.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for (tx, source) in outcome.transactions.iter().zip(&outcome.sources) {
        println!(
            "   {:10} │ {:30} │ {:>10} │ {:13} ({})",
            truncate(&tx.date, 10),
            truncate(&tx.description, 30),
            tx.amount,
            tx.category.as_str(),
            source.as_str()
        );
    }

    print_problems(&rejected, &outcome.warnings);

    Ok(())
}
