//! Budget command implementation

use std::path::Path;

use anyhow::Result;
use finflow_core::{AIClient, BudgetEntry, BudgetEvaluator, BudgetStatus, EngineConfig};

use super::{load_limits, print_problems, run_categorize};

pub async fn cmd_budgets(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
    limits_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let limits = load_limits(limits_path)?;
    let (outcome, rejected) = run_categorize(config, classifier, file, credit).await?;
    let entries = BudgetEvaluator::from_config(&config.budget).evaluate(&outcome.transactions, &limits);

    if json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!();
    println!("💰 Budget Tracker");
    println!("   ─────────────────────────────────────────────────────────────");
    print_budget_entries(&entries);

    if limits.is_empty() {
        println!();
        println!("   Tip: pass --limits budgets.json with e.g. {{\"Groceries\": 300}}");
    }

    print_problems(&rejected, &outcome.warnings);

    Ok(())
}

pub fn print_budget_entries(entries: &[BudgetEntry]) {
    for entry in entries {
        let icon = match entry.status {
            BudgetStatus::Over => "🔴",
            BudgetStatus::NearLimit => "🟡",
            BudgetStatus::Normal => "🟢",
        };

        match entry.percentage_used {
            Some(pct) => println!(
                "   {} {:15} │ ${:>9.2} / ${:<9.2} │ {:>4.0}% used",
                icon,
                entry.category.as_str(),
                entry.spent,
                entry.limit,
                pct
            ),
            None => println!(
                "   {} {:15} │ ${:>9.2} │ no limit",
                icon,
                entry.category.as_str(),
                entry.spent
            ),
        }
    }
}
