//! Analyze command implementation

use std::path::Path;

use anyhow::{Context, Result};
use finflow_core::{AIClient, AnalysisReport, EngineConfig};

use super::{
    build_analyzer, load_limits, load_statement, print_budget_entries, print_problems,
    sign_convention, truncate,
};

pub async fn cmd_analyze(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
    limits_path: Option<&Path>,
    json_output: bool,
) -> Result<()> {
    let limits = load_limits(limits_path)?;
    let table = load_statement(file)?;
    let analyzer = build_analyzer(config, classifier).await;

    let report = analyzer
        .analyze(&table, sign_convention(credit), &limits)
        .await
        .with_context(|| format!("Unusable statement: {}", file.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(file, &report);
    Ok(())
}

fn print_report(file: &Path, report: &AnalysisReport) {
    let summary = &report.summary;

    println!();
    println!("📊 Analysis of {}", file.display());
    println!("   Transactions: {}", summary.count);
    println!("   Income:       ${:.2}", summary.income);
    println!("   Expenses:     ${:.2}", summary.expenses);
    println!("   Net:          ${:.2}", summary.net);

    if !report.breakdown.is_empty() {
        println!();
        println!("🏷️  Spending by Category");
        println!("   ─────────────────────────────────────────────────────────────");
        for total in &report.breakdown {
            println!(
                "   {:15} │ ${:>10.2} │ {} transactions",
                total.category.as_str(),
                total.total,
                total.count
            );
        }
    }

    let flagged: Vec<_> = report
        .transactions
        .iter()
        .zip(&report.annotations)
        .filter(|(_, a)| a.is_unusual || a.is_duplicate || a.recurrence_warning.is_some())
        .collect();

    if !flagged.is_empty() {
        println!();
        println!("🚩 Flagged Transactions");
        println!("   ─────────────────────────────────────────────────────────────");
        for (tx, annotation) in flagged {
            let mut flags = Vec::new();
            if annotation.is_unusual {
                flags.push("unusual".to_string());
            }
            if annotation.is_duplicate {
                flags.push("duplicate".to_string());
            }
            if let Some(warning) = annotation.recurrence_warning {
                flags.push(format!("repeat {}", warning));
            }

            println!(
                "   {:10} │ {:30} │ {:>10} │ {}",
                truncate(&tx.date, 10),
                truncate(&tx.description, 30),
                tx.amount,
                flags.join(", ")
            );
        }
    }

    if !report.recurring.is_empty() {
        println!();
        println!("🔁 Recurring Charges");
        println!("   ─────────────────────────────────────────────────────────────");
        for group in &report.recurring {
            println!(
                "   {:25} │ {:9} │ ${:>8.2}/mo │ next {}",
                truncate(&group.description, 25),
                group.cadence.as_str(),
                group.monthly_equivalent,
                group.next_charge_date
            );
        }
        println!(
            "   Total: ${:.2}/month, ${:.2}/year",
            report.recurring_monthly_total,
            report.recurring_monthly_total * 12.0
        );
    }

    if !report.budgets.is_empty() {
        println!();
        println!("💰 Budgets");
        println!("   ─────────────────────────────────────────────────────────────");
        print_budget_entries(&report.budgets);
    }

    print_problems(&report.rejected_rows, &report.warnings);
}
