//! Recurring charges command implementation

use std::path::Path;

use anyhow::Result;
use finflow_core::{total_monthly_cost, AIClient, EngineConfig, RecurrenceDetector};
use serde_json::json;

use super::{print_problems, run_categorize, truncate};

pub async fn cmd_recurring(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
    json_output: bool,
) -> Result<()> {
    let (outcome, rejected) = run_categorize(config, classifier, file, credit).await?;
    let groups = RecurrenceDetector::from_config(&config.recurring).detect(&outcome.transactions);
    let monthly = total_monthly_cost(&groups);
    let yearly: f64 = groups.iter().map(|g| g.yearly_equivalent()).sum();

    if json_output {
        let output = json!({
            "groups": groups,
            "monthly_total": monthly,
            "yearly_total": yearly,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No recurring charges found in {}", file.display());
        print_problems(&rejected, &outcome.warnings);
        return Ok(());
    }

    println!();
    println!("🔁 Recurring Charges");
    println!("   ─────────────────────────────────────────────────────────────");

    for group in &groups {
        println!(
            "   {:25} │ {:>9}/{:<9} │ {:>9}/mo │ {:>10}/yr │ next {}",
            truncate(&group.description, 25),
            format!("${:.2}", group.amount),
            group.cadence.as_str(),
            format!("${:.2}", group.monthly_equivalent),
            format!("${:.2}", group.yearly_equivalent()),
            group.next_charge_date
        );
    }

    println!();
    println!("   Active:  {}", groups.len());
    println!("   Monthly: ${:.2}", monthly);
    println!("   Yearly:  ${:.2}", yearly);

    print_problems(&rejected, &outcome.warnings);

    Ok(())
}
