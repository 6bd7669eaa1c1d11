//! Ask command implementation

use std::path::Path;

use anyhow::{Context, Result};
use finflow_core::{ask_insights, AIClient, EngineConfig};

use super::{print_problems, run_categorize};

pub async fn cmd_ask(
    config: &EngineConfig,
    classifier: Option<AIClient>,
    file: &Path,
    credit: bool,
    question: &str,
    json_output: bool,
) -> Result<()> {
    let Some(client) = classifier else {
        anyhow::bail!(
            "No AI backend configured. Set OPENAI_COMPATIBLE_HOST, or AI_BACKEND=mock to try it out"
        );
    };

    let (outcome, rejected) = run_categorize(config, Some(client.clone()), file, credit).await?;
    let answer = ask_insights(&client, question, &outcome.transactions)
        .await
        .with_context(|| format!("Failed to answer question about {}", file.display()))?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }

    println!();
    println!("💬 {}", answer.question);
    println!("   ─────────────────────────────────────────────────────────────");
    for line in answer.answer.lines() {
        println!("   {}", line);
    }
    println!();
    println!(
        "   Answered by {} from {} transactions",
        answer.model,
        outcome.transactions.len()
    );

    print_problems(&rejected, &outcome.warnings);

    Ok(())
}
